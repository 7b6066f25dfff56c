use crate::handler::UploadHandler;
use crate::tracker::UploadTracker;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use upqueue::{PageConfig, UploadStatusItem};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// where parts are spooled while a post is read
    pub temp_dir: PathBuf,

    /// lower-case extensions accepted for file parts, empty accepts all
    pub allowed_extensions: HashSet<String>,

    /// finished uploads are reported this long before being dropped
    pub retain: Duration,

    /// largest accepted request body
    pub max_length: u64,

    /// url of the wasm-bindgen javascript glue
    pub pkg_url: String,

    pub page: PageConfig,
}

impl ServerConfig {
    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions.is_empty()
            || self
                .allowed_extensions
                .contains(&extension.to_lowercase())
    }
}

/// `SYSTEM` selects the system temp directory, anything else is a path.
pub fn temp_dir_from(path: &str) -> PathBuf {
    if path.eq_ignore_ascii_case("SYSTEM") {
        std::env::temp_dir()
    } else {
        PathBuf::from(path)
    }
}

/// Comma separated, case-insensitive extension list
pub fn parse_extensions(list: &str) -> HashSet<String> {
    list.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Trackers of every browser session, keyed by session cookie
#[derive(Debug, Clone, Default)]
pub struct Sessions(Arc<Mutex<HashMap<String, Vec<Arc<UploadTracker>>>>>);

impl Sessions {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Arc<UploadTracker>>>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start tracking a new post of `session`.
    pub fn register(&self, session: &str) -> Arc<UploadTracker> {
        let tracker = Arc::new(UploadTracker::new());

        self.lock()
            .entry(session.to_string())
            .or_insert_with(Vec::new)
            .push(tracker.clone());

        tracker
    }

    /// Status of all uploads of `session`, `None` for an unknown session.
    ///
    /// Uploads finished longer than `retain` ago are reported one last time
    /// and dropped, and so is a session left without uploads.
    pub fn report(&self, session: &str, retain: Duration) -> Option<Vec<UploadStatusItem>> {
        let mut sessions = self.lock();
        let trackers = sessions.get_mut(session)?;

        let items = trackers.iter().map(|t| t.to_item()).collect();
        trackers.retain(|t| !t.is_expired(retain));

        if trackers.is_empty() {
            sessions.remove(session);
        }

        Some(items)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub sessions: Sessions,
    pub handler: Arc<dyn UploadHandler>,
}

impl AppState {
    pub fn new(config: ServerConfig, handler: impl UploadHandler + 'static) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Sessions::default(),
            handler: Arc::new(handler),
        }
    }
}
