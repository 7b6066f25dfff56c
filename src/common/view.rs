use crate::{ItemId, Slot, UpqueueResult};
use std::time::Duration;
use url::Url;

/// Rendered node of one tracked upload
pub trait ItemView {
    /// Whether the item template contains an element for `slot`
    fn has_slot(&self, slot: Slot) -> bool;

    /// Show `value` in `slot`. `Slot::Progress` receives a css width such as
    /// `42%` and should animate towards it.
    fn set_slot(&mut self, slot: Slot, value: &str);

    /// Called once all slots of a poll have been written
    fn refresh(&mut self) {}
}

/// The list holding one [`ItemView`] per upload
pub trait QueueView {
    type Item: ItemView;

    /// Append a new node for `id` built from the item template
    fn append(&mut self, id: &ItemId) -> UpqueueResult<Self::Item>;

    /// Fade `item` out over `fade`, then detach it
    fn retire(&mut self, item: Self::Item, fade: Duration);

    /// Blocking notice for a failed poll
    fn alert(&mut self, message: &str);
}

/// Hidden frame a form submission is directed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub name: String,
    pub action: Url,
}

impl FrameSpec {
    pub const METHOD: &'static str = "post";
    pub const ENCTYPE: &'static str = "multipart/form-data";
}

/// The upload form
pub trait UploadTarget {
    /// Create the frame described by `frame`, point the form at it and reset
    /// the form's fields.
    fn arm(&mut self, frame: &FrameSpec) -> UpqueueResult<()>;
}
