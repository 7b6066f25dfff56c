mod client;
mod config;
mod error;
pub(crate) mod json;
mod schedule;
mod session;
mod size;
mod template;
mod view;

pub use client::StatusClient;
pub use config::{SessionConfig, Timing};
pub use error::{UpqueueError, UpqueueResult};
pub use json::{parse_poll_response, ItemId, Slot, UploadStatus, UploadStatusItem};
pub use schedule::{Scheduler, Task};
pub use session::{PollState, UploadSession};
pub use size::format_byte_size;
pub use template::{
    ItemTemplate, PageConfig, BACKGROUND_PLACEHOLDER, ENDPOINT_PLACEHOLDER, TEMPLATE_PLACEHOLDER,
};
pub use view::{FrameSpec, ItemView, QueueView, UploadTarget};

/// id of the upload form element
pub const FORM_ID: &'static str = "AjaxFileUpload";

/// id of the list holding one node per tracked upload
pub const QUEUE_ID: &'static str = "UploadQueue";

/// hidden frames are named `uploadFrame_<index>`
pub const FRAME_PREFIX: &'static str = "uploadFrame_";

/// multipart field carrying the file
pub const FILE_FIELD: &'static str = "file";
