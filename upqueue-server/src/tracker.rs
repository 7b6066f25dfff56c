use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use upqueue::{format_byte_size, ItemId, UploadStatus, UploadStatusItem};
use uuid::Uuid;

/// Progress of one multipart post, shared between the upload and status
/// handlers.
#[derive(Debug)]
pub struct UploadTracker {
    id: String,
    progress: Mutex<Progress>,
}

#[derive(Debug)]
struct Progress {
    status: UploadStatus,
    filename: String,
    message: String,

    bytes: u64,
    length: u64,
    items: usize,

    // last status change
    time: Instant,

    // bytes read during the last sampling window
    speed: u64,
    speed_read: u64,
    speed_time: Option<Instant>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            progress: Mutex::new(Progress {
                status: UploadStatus::Initializing,
                filename: String::new(),
                message: String::new(),
                bytes: 0,
                length: 0,
                items: 0,
                time: Instant::now(),
                speed: 0,
                speed_read: 0,
                speed_time: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        match self.progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `bytes_read` of `content_length` so far, while reading part `items`.
    pub fn update(&self, bytes_read: u64, content_length: Option<u64>, items: usize) {
        let now = Instant::now();
        let mut p = self.lock();

        p.length = content_length.unwrap_or(bytes_read);
        p.bytes = bytes_read;
        p.items = items;

        let sample = match p.speed_time {
            None => true,
            Some(at) => {
                now.duration_since(at) > Duration::from_secs(1)
                    || Some(bytes_read) == content_length
            }
        };
        if sample {
            p.speed_time = Some(now);
            p.speed = bytes_read.saturating_sub(p.speed_read);
            p.speed_read = bytes_read;
        }

        p.status = UploadStatus::Uploading;
        p.time = now;
    }

    /// The request body has been consumed completely.
    pub fn finish_reading(&self) {
        let mut p = self.lock();
        p.length = p.length.max(p.bytes);
        p.bytes = p.length;
    }

    pub fn set_status(&self, status: UploadStatus) {
        let mut p = self.lock();
        p.status = status;
        p.time = Instant::now();
    }

    pub fn set_filename(&self, filename: &str) {
        self.lock().filename = filename.to_string();
    }

    /// Mark the upload failed with `message`.
    pub fn fail(&self, filename: &str, message: &str) {
        let mut p = self.lock();
        p.status = UploadStatus::Error;
        p.filename = filename.to_string();
        p.message = message.to_string();
        p.time = Instant::now();
    }

    pub fn status(&self) -> UploadStatus {
        self.lock().status.clone()
    }

    pub fn items(&self) -> usize {
        self.lock().items
    }

    /// Finished longer than `retain` ago
    pub fn is_expired(&self, retain: Duration) -> bool {
        let p = self.lock();
        p.status.is_terminal() && p.time.elapsed() > retain
    }

    pub fn percent(&self) -> u64 {
        let p = self.lock();
        if p.length == 0 {
            0
        } else {
            100 * p.bytes / p.length
        }
    }

    pub fn to_item(&self) -> UploadStatusItem {
        let percent = self.percent();
        let p = self.lock();

        UploadStatusItem {
            id: ItemId::from(self.id.as_str()),
            status: Some(p.status.clone()),
            message: Some(p.message.clone()),
            filename: Some(p.filename.clone()),
            percent: Some(percent as f64),
            uploaded: Some(format_byte_size(p.bytes)),
            total: Some(format_byte_size(p.length)),
            speed: Some(format!("{}/s", format_byte_size(p.speed))),
        }
    }
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_initializing_with_zero_percent() {
        let tracker = UploadTracker::new();
        let item = tracker.to_item();

        assert_eq!(item.status, Some(UploadStatus::Initializing));
        assert_eq!(item.percent, Some(0.0));
        assert_eq!(item.total.as_deref(), Some("0.0 B"));
        assert_eq!(item.id.as_str(), tracker.id());
    }

    #[test]
    fn update_reports_uploading_progress() {
        let tracker = UploadTracker::new();
        tracker.update(1536, Some(3072), 1);

        let item = tracker.to_item();
        assert_eq!(item.status, Some(UploadStatus::Uploading));
        assert_eq!(item.percent, Some(50.0));
        assert_eq!(item.uploaded.as_deref(), Some("1.5 kB"));
        assert_eq!(item.total.as_deref(), Some("3.0 kB"));
        assert_eq!(item.speed.as_deref(), Some("1.5 kB/s"));
        assert_eq!(tracker.items(), 1);
    }

    #[test]
    fn unknown_length_follows_bytes_read() {
        let tracker = UploadTracker::new();
        tracker.update(100, None, 1);
        assert_eq!(tracker.percent(), 100);
    }

    #[test]
    fn finish_reading_completes_percent() {
        let tracker = UploadTracker::new();
        tracker.update(10, Some(200), 1);
        tracker.finish_reading();
        assert_eq!(tracker.percent(), 100);
    }

    #[test]
    fn only_terminal_trackers_expire() {
        let tracker = UploadTracker::new();
        tracker.update(10, Some(10), 1);
        assert!(!tracker.is_expired(Duration::from_secs(0)));

        tracker.set_status(UploadStatus::Done);
        assert!(!tracker.is_expired(Duration::from_secs(60)));

        std::thread::sleep(Duration::from_millis(5));
        assert!(tracker.is_expired(Duration::from_millis(1)));
    }

    #[test]
    fn fail_sets_error_fields() {
        let tracker = UploadTracker::new();
        tracker.set_filename("a.exe");
        tracker.fail("", "boom");

        let item = tracker.to_item();
        assert_eq!(item.status, Some(UploadStatus::Error));
        assert_eq!(item.filename.as_deref(), Some(""));
        assert_eq!(item.message.as_deref(), Some("boom"));
    }
}
