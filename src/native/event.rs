use crate::{Scheduler, Task, UploadStatusItem, UpqueueResult};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Everything that wakes the native driver up
#[derive(Debug)]
pub(crate) enum Event {
    Task(Task),
    Polled(UpqueueResult<Option<Vec<UploadStatusItem>>>),
    Submitted {
        frame: String,
        response: UpqueueResult<String>,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct Emitter(UnboundedSender<Event>);

impl Emitter {
    pub fn emit(&self, event: Event) -> UpqueueResult<()> {
        Ok(self
            .0
            .unbounded_send(event)
            .map_err(|e| e.into_send_error())?)
    }
}

pub(crate) struct Progress(UnboundedReceiver<Event>);

impl Stream for Progress {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().0).poll_next(cx)
    }
}

pub(crate) fn event_channel() -> (Emitter, Progress) {
    let (sender, receiver) = unbounded();
    (Emitter(sender), Progress(receiver))
}

/// Timers on the tokio runtime, fired tasks come back as [`Event::Task`]
pub(crate) struct TokioScheduler {
    emitter: Emitter,
}

impl TokioScheduler {
    pub fn new(emitter: Emitter) -> Self {
        Self { emitter }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, task: Task) {
        let emitter = self.emitter.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if let Err(e) = emitter.emit(Event::Task(task)) {
                log::debug!("driver gone, task dropped: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn scheduled_tasks_arrive_in_deadline_order() {
        let (emitter, mut progress) = event_channel();
        let mut scheduler = TokioScheduler::new(emitter);

        scheduler.schedule(Duration::from_millis(40), Task::ArmTarget);
        scheduler.schedule(Duration::from_millis(5), Task::Poll);

        match progress.next().await {
            Some(Event::Task(task)) => assert_eq!(task, Task::Poll),
            other => panic!("unexpected event: {:?}", other),
        }
        match progress.next().await {
            Some(Event::Task(task)) => assert_eq!(task, Task::ArmTarget),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
