use crate::ItemId;
use std::time::Duration;

/// Deferred work of an upload session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// request the status endpoint
    Poll,

    /// prepare a fresh hidden target for the next submission
    ArmTarget,

    /// fade out and drop the node of a finished upload
    Retire(ItemId),
}

/// Runs a [`Task`] once `delay` has elapsed.
///
/// Implementations hand the task back to [`UploadSession::run`] from the same
/// execution context that owns the session.
///
/// [`UploadSession::run`]: crate::UploadSession::run
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, task: Task);
}
