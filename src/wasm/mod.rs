mod dom;
mod runtime;

use crate::{
    PageConfig, SessionConfig, StatusClient, UploadSession, UpqueueError, UpqueueResult, FORM_ID,
};
use dom::{DomQueue, FrameTarget};
use url::Url;
use wasm_bindgen::JsCast;
use web_sys::HtmlFormElement;

/// Wire the page's upload form and queue list, then start polling.
pub fn start(config: PageConfig) -> UpqueueResult<()> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    // the rendered endpoint is usually relative to the page
    let page = Url::parse(&window.location().href()?)?;
    let endpoint = page.join(&config.endpoint)?;

    let form = document
        .get_element_by_id(FORM_ID)
        .ok_or_else(|| UpqueueError::Other(format!("element #{} not found", FORM_ID)))?
        .dyn_into::<HtmlFormElement>()
        .map_err(|_| UpqueueError::Other(format!("#{} is not a form", FORM_ID)))?;

    let queue = DomQueue::new(window, document.clone(), config.item_template)?;
    let target = FrameTarget::new(document, form.clone());

    let session_config = SessionConfig::new(endpoint.clone())?.with_background(config.background);
    let client = StatusClient::new(endpoint)?;

    log::info!(
        "upload queue on {} (background: {})",
        session_config.endpoint,
        session_config.background
    );

    let runtime = runtime::new(UploadSession::new(session_config, queue, target), client);
    runtime::bind_submit(&runtime, &form)?;
    runtime::start(&runtime)
}
