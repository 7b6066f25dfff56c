use crate::wasm::dom::{millis, DomQueue, FrameTarget};
use crate::{Scheduler, StatusClient, Task, UploadSession, UpqueueResult};
use gloo_timers::callback::Timeout;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlFormElement};

type PageSession = UploadSession<DomQueue, FrameTarget>;

/// Owns the page's session; timers, fetches and the submit listener all come
/// back here on the browser's event loop.
pub(crate) struct Runtime {
    session: RefCell<PageSession>,
    client: StatusClient,
}

/// `setTimeout` through gloo, holding the runtime weakly
struct TimeoutScheduler(Weak<Runtime>);

impl Scheduler for TimeoutScheduler {
    fn schedule(&mut self, delay: Duration, task: Task) {
        let runtime = self.0.clone();

        Timeout::new(millis(delay), move || {
            if let Some(runtime) = runtime.upgrade() {
                dispatch(&runtime, task);
            }
        })
        .forget();
    }
}

fn scheduler(runtime: &Rc<Runtime>) -> TimeoutScheduler {
    TimeoutScheduler(Rc::downgrade(runtime))
}

pub(crate) fn new(session: PageSession, client: StatusClient) -> Rc<Runtime> {
    Rc::new(Runtime {
        session: RefCell::new(session),
        client,
    })
}

pub(crate) fn start(runtime: &Rc<Runtime>) -> UpqueueResult<()> {
    let mut scheduler = scheduler(runtime);
    runtime.session.borrow_mut().start(&mut scheduler)
}

/// Listen for submits of `form`; the listener lives as long as the page.
pub(crate) fn bind_submit(runtime: &Rc<Runtime>, form: &HtmlFormElement) -> UpqueueResult<()> {
    let runtime = runtime.clone();

    let listener = Closure::wrap(Box::new(move |_: Event| {
        let mut scheduler = scheduler(&runtime);
        runtime.session.borrow_mut().on_submit(&mut scheduler);
    }) as Box<dyn FnMut(Event)>);

    form.add_event_listener_with_callback("submit", listener.as_ref().unchecked_ref())?;
    listener.forget();

    Ok(())
}

fn dispatch(runtime: &Rc<Runtime>, task: Task) {
    let poll = runtime.session.borrow_mut().run(task);
    if !poll {
        return;
    }

    let runtime = runtime.clone();
    spawn_local(async move {
        let result = runtime.client.poll().await;

        let mut scheduler = scheduler(&runtime);
        let mut session = runtime.session.borrow_mut();
        match result {
            Ok(items) => session.apply_response(items, &mut scheduler),
            Err(e) => session.apply_failure(&e),
        }
    });
}
