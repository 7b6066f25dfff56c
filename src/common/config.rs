use crate::{UploadStatus, UpqueueResult};
use reqwest::IntoUrl;
use std::time::Duration;
use url::Url;

/// Fixed delays driving the upload queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// between two polls while the server reports uploads
    pub poll_interval: Duration,

    /// from a submit to the first poll when the poller was idle
    pub kick_delay: Duration,

    /// from a submit to arming the next upload target
    pub rearm_delay: Duration,

    /// how long a `Done` item stays visible
    pub done_linger: Duration,

    /// how long an `Error` item stays visible
    pub error_linger: Duration,

    /// fade-out animation length before a node is detached
    pub fade: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            kick_delay: Duration::from_millis(500),
            rearm_delay: Duration::from_millis(500),
            done_linger: Duration::from_secs(5),
            error_linger: Duration::from_secs(30),
            fade: Duration::from_millis(600),
        }
    }
}

impl Timing {
    /// Delay before a node in `status` is removed, `None` while it is running
    pub fn linger(&self, status: &UploadStatus) -> Option<Duration> {
        match status {
            UploadStatus::Done => Some(self.done_linger),
            UploadStatus::Error => Some(self.error_linger),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// status endpoint, also the form's action
    pub endpoint: Url,

    /// background upload mode as rendered into the page
    pub background: bool,

    pub timing: Timing,
}

impl SessionConfig {
    pub fn new(endpoint: impl IntoUrl) -> UpqueueResult<Self> {
        Ok(Self {
            endpoint: endpoint.into_url()?,
            background: false,
            timing: Timing::default(),
        })
    }

    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}
