mod handler;
mod reply;
mod routes;
mod state;
mod tracker;
mod upload;

use crate::handler::StoreHandler;
use crate::state::{parse_extensions, temp_dir_from, AppState, ServerConfig};
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;
use upqueue::PageConfig;
use warp::Filter;

type Exception = Box<dyn Error + Sync + Send + 'static>;

const DEFAULT_ITEM_TEMPLATE: &str = r#"<b class="filename"></b> <span class="status"></span>
<div class="progressbar"><div class="progress"></div></div>
<span class="uploaded"></span> / <span class="total"></span> <span class="speed"></span>
<div class="message"></div>"#;

#[derive(StructOpt, Debug)]
#[structopt(name = "upqueue-server")]
struct Opts {
    /// Address to listen on
    #[structopt(short, long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Static files served next to the upload endpoint
    #[structopt(long, default_value = "./public/", parse(from_os_str))]
    public: PathBuf,

    /// Spool directory, `SYSTEM` for the system temp directory
    #[structopt(long, default_value = "SYSTEM")]
    temp_path: String,

    /// Comma separated file extensions accepted, empty accepts all
    #[structopt(long, default_value = "")]
    allowed_extensions: String,

    /// Where received files are stored
    #[structopt(long, default_value = "./uploads/", parse(from_os_str))]
    store: PathBuf,

    /// Html file used for every queue item
    #[structopt(long, parse(from_os_str))]
    item_template: Option<PathBuf>,

    /// Url of the wasm-bindgen javascript glue
    #[structopt(long, default_value = "/pkg/upqueue4js.js")]
    pkg_url: String,

    /// Render background upload mode into the page
    #[structopt(long)]
    background: bool,

    /// Seconds finished uploads are still reported
    #[structopt(long, default_value = "5")]
    retain: u64,

    /// Largest accepted request body in bytes
    #[structopt(long, default_value = "1073741824")]
    max_length: u64,
}

#[tokio::main]
async fn main() -> Result<(), Exception> {
    env_logger::init();

    let opts: Opts = Opts::from_args();

    let item_template = match &opts.item_template {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEFAULT_ITEM_TEMPLATE.to_string(),
    };

    let config = ServerConfig {
        temp_dir: temp_dir_from(&opts.temp_path),
        allowed_extensions: parse_extensions(&opts.allowed_extensions),
        retain: Duration::from_secs(opts.retain),
        max_length: opts.max_length,
        pkg_url: opts.pkg_url,
        page: PageConfig {
            endpoint: format!("/{}", routes::ROUTE),
            background: opts.background,
            item_template,
        },
    };

    log::info!(
        "spooling to {}, storing to {}",
        config.temp_dir.display(),
        opts.store.display()
    );
    if config.allowed_extensions.is_empty() {
        log::warn!("all file extensions are accepted");
    }

    let state = AppState::new(config, StoreHandler::new(opts.store));

    let file = warp::get().and(warp::fs::dir(opts.public));
    let routes = routes::routes(state)
        .or(file)
        .with(warp::log("upqueue"));

    log::info!("listening on http://{}/", opts.listen);
    warp::serve(routes).run(opts.listen).await;

    Ok(())
}
