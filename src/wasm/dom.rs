use crate::{
    FrameSpec, ItemId, ItemView, QueueView, Slot, UploadTarget, UpqueueError, UpqueueResult,
    QUEUE_ID,
};
use gloo_timers::callback::Timeout;
use std::time::Duration;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlFormElement, HtmlIFrameElement, Window};

// jQuery's "slow"
const PROGRESS_TRANSITION: &str = "width 0.6s ease";

/// The `#UploadQueue` list
pub(crate) struct DomQueue {
    window: Window,
    document: Document,
    container: Element,
    template: String,
}

impl DomQueue {
    pub fn new(window: Window, document: Document, template: String) -> UpqueueResult<Self> {
        let container = document
            .get_element_by_id(QUEUE_ID)
            .ok_or_else(|| UpqueueError::Other(format!("element #{} not found", QUEUE_ID)))?;

        Ok(Self {
            window,
            document,
            container,
            template,
        })
    }
}

/// One `<li>` of the queue
pub(crate) struct DomItem {
    element: Element,
}

impl DomItem {
    fn find(&self, slot: Slot) -> Option<Element> {
        self.element
            .query_selector(&format!(".{}", slot.class_name()))
            .ok()
            .flatten()
    }
}

impl ItemView for DomItem {
    fn has_slot(&self, slot: Slot) -> bool {
        self.find(slot).is_some()
    }

    fn set_slot(&mut self, slot: Slot, value: &str) {
        let element = match self.find(slot) {
            Some(element) => element,
            None => return,
        };

        match slot {
            Slot::Progress => match element.dyn_into::<HtmlElement>() {
                Ok(bar) => {
                    let style = bar.style();
                    let result = style
                        .set_property("transition", PROGRESS_TRANSITION)
                        .and_then(|_| style.set_property("width", value));
                    if let Err(e) = result {
                        log::warn!("cannot animate progress: {:?}", e);
                    }
                }
                Err(_) => log::warn!("progress slot is not an html element"),
            },
            _ => element.set_text_content(Some(value)),
        }
    }
}

impl QueueView for DomQueue {
    type Item = DomItem;

    fn append(&mut self, id: &ItemId) -> UpqueueResult<DomItem> {
        let element = self.document.create_element("li")?;
        element.set_id(id.as_str());
        element.set_inner_html(&self.template);

        self.container.append_child(&element)?;

        Ok(DomItem { element })
    }

    fn retire(&mut self, item: DomItem, fade: Duration) {
        let element = item.element;

        if let Some(node) = element.dyn_ref::<HtmlElement>() {
            let style = node.style();
            let transition = format!("opacity {}ms", fade.as_millis());
            let result = style
                .set_property("transition", &transition)
                .and_then(|_| style.set_property("opacity", "0"));
            if let Err(e) = result {
                log::warn!("cannot fade out queue item: {:?}", e);
            }
        }

        Timeout::new(millis(fade), move || element.remove()).forget();
    }

    fn alert(&mut self, message: &str) {
        if let Err(e) = self.window.alert_with_message(message) {
            log::error!("cannot show alert: {:?}", e);
        }
    }
}

/// The `#AjaxFileUpload` form and its hidden frames
pub(crate) struct FrameTarget {
    document: Document,
    form: HtmlFormElement,
}

impl FrameTarget {
    pub fn new(document: Document, form: HtmlFormElement) -> Self {
        Self { document, form }
    }
}

impl UploadTarget for FrameTarget {
    fn arm(&mut self, frame: &FrameSpec) -> UpqueueResult<()> {
        let body = self.document.body().ok_or("document has no body")?;

        let iframe = self
            .document
            .create_element("iframe")?
            .dyn_into::<HtmlIFrameElement>()
            .map_err(|_| "cannot create an iframe")?;

        iframe.set_id(&frame.name);
        iframe.set_name(&frame.name);
        iframe.set_width("0");
        iframe.set_height("0");
        iframe.set_attribute("frameborder", "0")?;
        iframe.set_attribute("scrolling", "yes")?;
        iframe.set_src("about:blank");
        body.append_child(&iframe)?;

        self.form.set_enctype(FrameSpec::ENCTYPE);
        self.form.set_method(FrameSpec::METHOD);
        self.form.set_target(&frame.name);
        self.form.set_action(frame.action.as_str());
        self.form.reset();

        Ok(())
    }
}

pub(crate) fn millis(delay: Duration) -> u32 {
    delay.as_millis().min(u32::MAX as u128) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parse_poll_response, Scheduler, SessionConfig, Task, UploadSession, FORM_ID,
    };
    use url::Url;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[derive(Default)]
    struct Deferred(Vec<Task>);

    impl Scheduler for Deferred {
        fn schedule(&mut self, _delay: Duration, task: Task) {
            self.0.push(task);
        }
    }

    /// Fresh `#UploadQueue` list and `#AjaxFileUpload` form in the body
    fn page() -> (Window, Document, HtmlFormElement) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();
        let body = document.body().unwrap();

        for id in &[QUEUE_ID, FORM_ID] {
            if let Some(old) = document.get_element_by_id(id) {
                old.remove();
            }
        }

        let queue = document.create_element("ul").unwrap();
        queue.set_id(QUEUE_ID);
        body.append_child(&queue).unwrap();

        let form = document
            .create_element("form")
            .unwrap()
            .dyn_into::<HtmlFormElement>()
            .unwrap();
        form.set_id(FORM_ID);
        body.append_child(&form).unwrap();

        (window, document, form)
    }

    #[wasm_bindgen_test]
    fn arm_points_form_at_hidden_frame() {
        let (_, document, form) = page();
        let mut target = FrameTarget::new(document.clone(), form.clone());

        let frame = FrameSpec {
            name: "uploadFrame_7".into(),
            action: Url::parse("http://localhost/upload").unwrap(),
        };
        target.arm(&frame).unwrap();

        let iframe = document
            .get_element_by_id("uploadFrame_7")
            .unwrap()
            .dyn_into::<HtmlIFrameElement>()
            .unwrap();
        assert_eq!(iframe.name(), "uploadFrame_7");
        assert_eq!(iframe.width(), "0");
        assert_eq!(iframe.height(), "0");

        assert_eq!(form.target(), "uploadFrame_7");
        assert_eq!(form.action(), "http://localhost/upload");
        assert_eq!(form.method(), "post");
        assert_eq!(form.enctype(), "multipart/form-data");
    }

    #[wasm_bindgen_test]
    fn slots_are_filled_as_text() {
        let (window, document, _) = page();
        let mut queue = DomQueue::new(
            window,
            document.clone(),
            r#"<span class="status"></span><div class="progress"></div>"#.into(),
        )
        .unwrap();

        let mut item = queue.append(&ItemId::from("17")).unwrap();
        assert!(item.has_slot(Slot::Status));
        assert!(!item.has_slot(Slot::Speed));

        item.set_slot(Slot::Status, "<b>Uploading</b>");
        item.set_slot(Slot::Progress, "40%");

        let li = document.get_element_by_id("17").unwrap();
        assert_eq!(li.tag_name(), "LI");

        let status = li.query_selector(".status").unwrap().unwrap();
        assert_eq!(status.text_content().unwrap(), "<b>Uploading</b>");
        assert_eq!(status.child_element_count(), 0);

        let bar = li
            .query_selector(".progress")
            .unwrap()
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap();
        assert_eq!(bar.style().get_property_value("width").unwrap(), "40%");
    }

    #[wasm_bindgen_test]
    fn repeated_reports_keep_one_node() {
        let (window, document, form) = page();
        let queue = DomQueue::new(
            window,
            document.clone(),
            r#"<span class="status"></span>"#.into(),
        )
        .unwrap();
        let target = FrameTarget::new(document.clone(), form);
        let config = SessionConfig::new("http://localhost/upload").unwrap();
        let mut session = UploadSession::new(config, queue, target);
        let mut scheduler = Deferred::default();

        let first = parse_poll_response(r#"[{"id":3,"status":"Uploading"}]"#).unwrap();
        let second = parse_poll_response(r#"[{"id":"3","status":"Processing"}]"#).unwrap();
        session.apply_response(first, &mut scheduler);
        session.apply_response(second, &mut scheduler);

        let container = document.get_element_by_id(QUEUE_ID).unwrap();
        assert_eq!(container.child_element_count(), 1);

        let status = document.query_selector("#UploadQueue .status").unwrap().unwrap();
        assert_eq!(status.text_content().unwrap(), "Processing");
    }
}
