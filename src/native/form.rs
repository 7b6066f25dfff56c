use crate::native::event::{Emitter, Event};
use crate::{FrameSpec, UploadTarget, UpqueueError, UpqueueResult, FILE_FIELD};
use reqwest::Url;
use std::path::Path;

/// Native stand-in for the page form: every armed frame carries exactly one
/// multipart submission, whose response lands in that frame.
#[derive(Debug)]
pub struct FormTarget {
    client: reqwest::Client,
    emitter: Emitter,

    armed: Option<FrameSpec>,
    frames: Vec<String>,
    in_flight: usize,
}

impl FormTarget {
    pub(crate) fn new(client: reqwest::Client, emitter: Emitter) -> Self {
        Self {
            client,
            emitter,
            armed: None,
            frames: Vec::new(),
            in_flight: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Names of the frames that received a submission
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Post `path` into the armed frame. The frame is used up; a new one has
    /// to be armed before the next submission.
    pub fn submit(&mut self, path: impl AsRef<Path>) -> UpqueueResult<String> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(UpqueueError::Other(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let frame = self
            .armed
            .take()
            .ok_or_else(|| UpqueueError::from("no upload target is armed"))?;

        let client = self.client.clone();
        let emitter = self.emitter.clone();
        let name = frame.name.clone();

        tokio::spawn(async move {
            let response = send_form(&client, frame.action, &path).await;

            if let Err(e) = emitter.emit(Event::Submitted {
                frame: frame.name,
                response,
            }) {
                log::debug!("driver gone, submission result dropped: {}", e);
            }
        });

        self.in_flight += 1;
        self.frames.push(name.clone());

        Ok(name)
    }

    pub(crate) fn finished(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

impl UploadTarget for FormTarget {
    fn arm(&mut self, frame: &FrameSpec) -> UpqueueResult<()> {
        // re-arming resets the form, an unused frame is simply dropped
        if let Some(unused) = self.armed.replace(frame.clone()) {
            log::debug!("upload target {} was never used", unused.name);
        }
        Ok(())
    }
}

async fn send_form(client: &reqwest::Client, action: Url, path: &Path) -> UpqueueResult<String> {
    use reqwest::multipart::*;

    let data = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    log::info!("submitting {} ({} bytes)", file_name, data.len());

    let file = Part::bytes(data).file_name(file_name);
    let form = Form::new().part(FILE_FIELD, file);

    let req = client.post(action).multipart(form).build()?;

    Ok(client.execute(req).await?.error_for_status()?.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::event::event_channel;

    fn frame(name: &str) -> FrameSpec {
        FrameSpec {
            name: name.into(),
            action: Url::parse("http://127.0.0.1:9/upload").unwrap(),
        }
    }

    #[tokio::test]
    async fn submit_needs_an_armed_frame() {
        let (emitter, _progress) = event_channel();
        let mut target = FormTarget::new(reqwest::Client::new(), emitter);
        let file = tempfile::NamedTempFile::new().unwrap();

        assert!(target.submit(file.path()).is_err());

        target.arm(&frame("uploadFrame_0")).unwrap();
        assert!(target.is_armed());
        assert_eq!(target.submit(file.path()).unwrap(), "uploadFrame_0");
        assert!(!target.is_armed());
        assert_eq!(target.in_flight(), 1);

        // used up until the next arm
        assert!(target.submit(file.path()).is_err());
    }

    #[tokio::test]
    async fn rejects_missing_files() {
        let (emitter, _progress) = event_channel();
        let mut target = FormTarget::new(reqwest::Client::new(), emitter);
        target.arm(&frame("uploadFrame_0")).unwrap();

        assert!(target.submit("/definitely/not/here.bin").is_err());
        assert!(target.is_armed());
    }
}
