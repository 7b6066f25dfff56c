use crate::handler::ReceivedFile;
use crate::state::AppState;
use crate::tracker::UploadTracker;
use crate::Exception;
use bytes::Buf;
use futures_util::{pin_mut, TryStreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use upqueue::{format_byte_size, UploadStatus};
use uuid::Uuid;
use warp::multipart::{FormData, Part};

/// Bytes of the request body seen so far
struct Meter<'a> {
    tracker: &'a UploadTracker,
    read: u64,
    length: Option<u64>,
    items: usize,
}

impl Meter<'_> {
    fn advance(&mut self, n: usize) {
        self.read += n as u64;
        self.tracker.update(self.read, self.length, self.items);
    }
}

/// Read a multipart post into the spool directory and hand it to the upload
/// handler. Every outcome ends up in `tracker`.
pub async fn receive(
    state: &AppState,
    tracker: &UploadTracker,
    content_length: Option<u64>,
    form: FormData,
) {
    let mut files = Vec::new();

    if let Err(e) = process(state, tracker, content_length, form, &mut files).await {
        log::error!("upload {} failed: {}", tracker.id(), e);
        tracker.fail("", &e.to_string());
    }

    log::info!(
        "upload {} ended {} ({} parts)",
        tracker.id(),
        tracker.status().as_str(),
        tracker.items()
    );

    for file in files {
        match tokio::fs::remove_file(&file.path).await {
            Ok(()) => log::debug!("removed spooled {}", file.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("can't remove {}: {}", file.path.display(), e),
        }
    }
}

async fn process(
    state: &AppState,
    tracker: &UploadTracker,
    content_length: Option<u64>,
    form: FormData,
    files: &mut Vec<ReceivedFile>,
) -> Result<(), Exception> {
    let config = &state.config;
    let mut fields = HashMap::new();
    let mut meter = Meter {
        tracker,
        read: 0,
        length: content_length,
        items: 0,
    };

    pin_mut!(form);
    while let Some(part) = form.try_next().await? {
        meter.items += 1;

        let file_name = match part.filename().map(str::to_string) {
            Some(name) => name,
            None => {
                let name = part.name().to_string();
                let value = read_field(part, &mut meter).await?;
                fields.insert(name, value);
                continue;
            }
        };

        let ext = extension(&file_name);
        if !config.allows(&ext) {
            let msg = format!("File type '{}' is not allowed!", ext);
            log::warn!("{}", msg);
            tracker.fail(&file_name, &msg);
            return Ok(());
        }

        tracker.set_filename(&file_name);

        let file = spool(&config.temp_dir, file_name, part, &mut meter).await?;
        log::info!(
            "Received file: {} ({})",
            file.file_name,
            format_byte_size(file.size)
        );
        files.push(file);
    }

    tracker.finish_reading();
    tracker.set_status(UploadStatus::Processing);

    let handler = state.handler.clone();
    let received = files.clone();
    tokio::task::spawn_blocking(move || handler.handle(&fields, &received))
        .await
        .map_err(|e| e.to_string())??;

    tracker.set_status(UploadStatus::Done);

    Ok(())
}

async fn read_field(part: Part, meter: &mut Meter<'_>) -> Result<String, Exception> {
    let mut value = Vec::new();

    let data = part.stream();
    pin_mut!(data);
    while let Some(mut buf) = data.try_next().await? {
        while buf.has_remaining() {
            let chunk = buf.chunk();
            let n = chunk.len();
            value.extend_from_slice(chunk);
            buf.advance(n);
            meter.advance(n);
        }
    }

    Ok(String::from_utf8_lossy(&value).into_owned())
}

async fn spool(
    dir: &Path,
    file_name: String,
    part: Part,
    meter: &mut Meter<'_>,
) -> Result<ReceivedFile, Exception> {
    tokio::fs::create_dir_all(dir).await?;

    let path = spool_path(dir);
    let mut file = tokio::fs::File::create(&path).await?;

    let mut received = ReceivedFile {
        field: part.name().to_string(),
        file_name,
        content_type: part.content_type().map(str::to_string),
        path,
        size: 0,
    };

    let written = write_part(&mut file, part, &mut received, meter).await;
    drop(file);

    if let Err(e) = written {
        // a broken body never reaches the cleanup list
        if let Err(rm) = tokio::fs::remove_file(&received.path).await {
            log::warn!("can't remove {}: {}", received.path.display(), rm);
        }
        return Err(e);
    }

    Ok(received)
}

async fn write_part(
    file: &mut tokio::fs::File,
    part: Part,
    received: &mut ReceivedFile,
    meter: &mut Meter<'_>,
) -> Result<(), Exception> {
    let data = part.stream();
    pin_mut!(data);
    while let Some(mut buf) = data.try_next().await? {
        while buf.has_remaining() {
            let chunk = buf.chunk();
            let n = chunk.len();
            file.write_all(chunk).await?;
            buf.advance(n);
            received.size += n as u64;
            meter.advance(n);
        }
    }
    file.flush().await?;

    Ok(())
}

fn spool_path(dir: &Path) -> PathBuf {
    dir.join(format!("upqueue-{}.part", Uuid::new_v4().simple()))
}

/// Lower-case text after the last dot of the base name, empty if none
pub fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
