use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;
use upqueue::{run_uploads, ConsoleQueue, ItemTemplate, SessionConfig, UpqueueResult};
use url::Url;

/// Upload files and follow the server's upload queue
#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "upqueue-cli")]
struct Opts {
    /// upload endpoint, also polled for status
    #[structopt(short, long)]
    endpoint: Url,

    /// files to upload, one submission each
    #[structopt(short, long, parse(from_os_str))]
    file: Vec<PathBuf>,

    /// queue item html, only the slots it contains are shown
    #[structopt(short, long, parse(from_os_str))]
    template: Option<PathBuf>,

    /// request timeout in seconds
    #[structopt(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> UpqueueResult<()> {
    env_logger::init();

    let Opts {
        endpoint,
        file,
        template,
        timeout,
    } = Opts::from_args();

    let view = match template {
        Some(path) => {
            let html = std::fs::read_to_string(&path)?;
            ConsoleQueue::new(ItemTemplate::new(&html))
        }
        None => ConsoleQueue::with_all_slots(),
    };

    let config = SessionConfig::new(endpoint)?;
    let submissions = run_uploads(config, file, view, timeout.map(Duration::from_secs)).await?;

    let mut failed = 0;
    for submission in &submissions {
        match &submission.response {
            Ok(_) => println!(
                "File {} uploaded.(frame: {})",
                submission.file.display(),
                submission.frame
            ),
            Err(e) => {
                failed += 1;
                eprintln!("File {} failed: {}", submission.file.display(), e);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} uploads failed", failed, submissions.len()).into());
    }

    Ok(())
}
