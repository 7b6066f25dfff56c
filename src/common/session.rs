use crate::{
    FrameSpec, ItemId, ItemView, QueueView, Scheduler, SessionConfig, Slot, Task, UploadStatusItem,
    UploadTarget, UpqueueError, UpqueueResult, FRAME_PREFIX,
};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Where the poll loop stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// nothing scheduled, restarted by the next submit
    Idle,

    /// a [`Task::Poll`] is pending
    Scheduled,

    /// a request is on the wire; `rearm` is set when a submit arrived meanwhile
    InFlight { rearm: bool },
}

#[derive(Debug)]
struct Tracked<I> {
    view: I,
    retiring: bool,
}

/// Controller of one page: arms upload targets and reflects the status
/// endpoint into the queue view.
///
/// Every method runs on the single context that owns the session. Deferred
/// work goes through the [`Scheduler`] passed in and comes back via
/// [`UploadSession::run`].
pub struct UploadSession<V: QueueView, T: UploadTarget> {
    config: SessionConfig,
    view: V,
    target: T,

    upload_index: u64,
    poll: PollState,

    items: HashMap<ItemId, Tracked<V::Item>>,
    // removed after a terminal state but still reported by the server
    retired: HashSet<ItemId>,
}

impl<V: QueueView, T: UploadTarget> UploadSession<V, T> {
    pub fn new(config: SessionConfig, view: V, target: T) -> Self {
        Self {
            config,
            view,
            target,
            upload_index: 0,
            poll: PollState::Idle,
            items: HashMap::new(),
            retired: HashSet::new(),
        }
    }

    /// Page load: arm the first target and poll right away.
    pub fn start(&mut self, scheduler: &mut impl Scheduler) -> UpqueueResult<()> {
        self.arm_target()?;

        if self.poll == PollState::Idle {
            self.poll = PollState::Scheduled;
            scheduler.schedule(Duration::from_millis(0), Task::Poll);
        }

        Ok(())
    }

    /// Create the next hidden frame and point the form at it.
    pub fn arm_target(&mut self) -> UpqueueResult<FrameSpec> {
        let frame = FrameSpec {
            name: format!("{}{}", FRAME_PREFIX, self.upload_index),
            action: self.config.endpoint.clone(),
        };

        self.target.arm(&frame)?;
        self.upload_index += 1;

        log::debug!("upload target {} armed", frame.name);

        Ok(frame)
    }

    /// The form was submitted into the current target.
    ///
    /// Returns whether this submit moved the poller out of idle.
    pub fn on_submit(&mut self, scheduler: &mut impl Scheduler) -> bool {
        let activated = self.ensure_polling(scheduler);
        scheduler.schedule(self.config.timing.rearm_delay, Task::ArmTarget);
        activated
    }

    /// Make sure a poll will happen. Idempotent: only an idle poller schedules
    /// a new request.
    pub fn ensure_polling(&mut self, scheduler: &mut impl Scheduler) -> bool {
        match self.poll {
            PollState::Idle => {
                self.poll = PollState::Scheduled;
                scheduler.schedule(self.config.timing.kick_delay, Task::Poll);
                log::debug!("poll loop started");
                true
            }
            PollState::Scheduled => false,
            PollState::InFlight { .. } => {
                self.poll = PollState::InFlight { rearm: true };
                false
            }
        }
    }

    /// Execute a task handed back by the scheduler.
    ///
    /// Returns `true` when the caller must now request the status endpoint and
    /// report back through [`apply_response`](Self::apply_response) or
    /// [`apply_failure`](Self::apply_failure).
    pub fn run(&mut self, task: Task) -> bool {
        match task {
            Task::Poll => self.begin_poll(),
            Task::ArmTarget => {
                if let Err(e) = self.arm_target() {
                    log::error!("cannot arm upload target: {}", e);
                }
                false
            }
            Task::Retire(id) => {
                self.retire(&id);
                false
            }
        }
    }

    fn begin_poll(&mut self) -> bool {
        match self.poll {
            PollState::Scheduled => {
                self.poll = PollState::InFlight { rearm: false };
                true
            }
            state => {
                log::debug!("stale poll ignored ({:?})", state);
                false
            }
        }
    }

    /// Reflect a status response. `None` or an empty list stops the loop.
    pub fn apply_response(
        &mut self,
        items: Option<Vec<UploadStatusItem>>,
        scheduler: &mut impl Scheduler,
    ) {
        let rearm = match self.poll {
            PollState::InFlight { rearm } => rearm,
            _ => false,
        };

        let items = items.unwrap_or_default();

        if !items.is_empty() {
            self.poll = PollState::Scheduled;
            scheduler.schedule(self.config.timing.poll_interval, Task::Poll);
        } else if rearm {
            self.poll = PollState::Scheduled;
            scheduler.schedule(self.config.timing.kick_delay, Task::Poll);
        } else {
            self.poll = PollState::Idle;
            log::debug!("poll loop idle");
        }

        for item in &items {
            if let Err(e) = self.reflect(item, scheduler) {
                log::warn!("cannot show upload {}: {}", item.id, e);
            }
        }

        self.retired
            .retain(|id| items.iter().any(|item| &item.id == id));
    }

    /// The status request failed: tell the user and stop polling.
    pub fn apply_failure(&mut self, error: &UpqueueError) {
        self.poll = PollState::Idle;
        log::error!("status request failed: {}", error);
        self.view.alert(&error.to_string());
    }

    fn reflect(
        &mut self,
        item: &UploadStatusItem,
        scheduler: &mut impl Scheduler,
    ) -> UpqueueResult<()> {
        if self.retired.contains(&item.id) {
            return Ok(());
        }

        let timing = self.config.timing;

        let tracked = match self.items.entry(item.id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let view = self.view.append(&item.id)?;
                entry.insert(Tracked {
                    view,
                    retiring: false,
                })
            }
        };

        for slot in Slot::ALL.iter().copied() {
            if let Some(value) = item.slot_value(slot) {
                if tracked.view.has_slot(slot) {
                    tracked.view.set_slot(slot, &value);
                }
            }
        }
        tracked.view.refresh();

        if !tracked.retiring {
            let linger = item
                .status
                .as_ref()
                .and_then(|status| timing.linger(status));

            if let Some(linger) = linger {
                tracked.retiring = true;
                scheduler.schedule(linger, Task::Retire(item.id.clone()));
            }
        }

        Ok(())
    }

    fn retire(&mut self, id: &ItemId) {
        if let Some(tracked) = self.items.remove(id) {
            log::debug!("upload {} retired", id);
            self.retired.insert(id.clone());
            self.view.retire(tracked.view, self.config.timing.fade);
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll != PollState::Idle
    }

    pub fn poll_state(&self) -> PollState {
        self.poll
    }

    /// Number of targets armed so far
    pub fn upload_index(&self) -> u64 {
        self.upload_index
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items waiting for their removal delay
    pub fn pending_retirements(&self) -> usize {
        self.items.values().filter(|t| t.retiring).count()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }
}
