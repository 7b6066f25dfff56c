mod console;
mod event;
mod form;

pub use console::{ConsoleItem, ConsoleQueue};
pub use form::FormTarget;

use crate::{QueueView, SessionConfig, StatusClient, UploadSession, UpqueueError, UpqueueResult};
use event::{event_channel, Event, TokioScheduler};
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one file posted into its hidden frame
#[derive(Debug)]
pub struct Submission {
    pub frame: String,
    pub file: PathBuf,

    /// body the server answered the post with
    pub response: UpqueueResult<String>,
}

/// Upload `files` one submission at a time and mirror the status endpoint into
/// `view` until every post has returned and the queue has drained.
pub async fn run_uploads<V: QueueView>(
    config: SessionConfig,
    files: Vec<PathBuf>,
    view: V,
    timeout: Option<Duration>,
) -> UpqueueResult<Vec<Submission>> {
    if let Some(file) = files.iter().find(|f| !f.is_file()) {
        return Err(UpqueueError::Other(format!(
            "{} is not a regular file",
            file.display()
        )));
    }

    let client = StatusClient::new(config.endpoint.clone(), timeout)?;

    let (emitter, mut progress) = event_channel();
    let mut scheduler = TokioScheduler::new(emitter.clone());

    let target = FormTarget::new(client.http().clone(), emitter.clone());
    let mut session = UploadSession::new(config, view, target);

    let mut pending: VecDeque<PathBuf> = files.into();
    let mut posted: HashMap<String, PathBuf> = HashMap::new();
    let mut submissions = Vec::with_capacity(pending.len());

    // like a page, the first answer of the status endpoint (and its session
    // cookie) comes before any submission
    let mut loaded = false;

    session.start(&mut scheduler)?;

    while let Some(event) = progress.next().await {
        if let Event::Polled(_) = event {
            loaded = true;
        }

        match event {
            Event::Task(task) => {
                if session.run(task) {
                    let client = client.clone();
                    let emitter = emitter.clone();
                    tokio::spawn(async move {
                        let result = client.poll().await;
                        if let Err(e) = emitter.emit(Event::Polled(result)) {
                            log::debug!("driver gone, poll result dropped: {}", e);
                        }
                    });
                }
            }
            Event::Polled(Ok(items)) => session.apply_response(items, &mut scheduler),
            Event::Polled(Err(e)) => session.apply_failure(&e),
            Event::Submitted { frame, response } => {
                session.target_mut().finished();

                match &response {
                    Ok(_) => log::info!("{} returned", frame),
                    Err(e) => log::warn!("{} failed: {}", frame, e),
                }

                // the final state of this upload is still to be shown
                session.ensure_polling(&mut scheduler);

                let file = posted.remove(&frame).unwrap_or_default();
                submissions.push(Submission {
                    frame,
                    file,
                    response,
                });
            }
        }

        if loaded {
            submit_next(&mut session, &mut scheduler, &mut pending, &mut posted)?;
        }

        if pending.is_empty()
            && session.target().in_flight() == 0
            && !session.is_polling()
            && session.pending_retirements() == 0
        {
            break;
        }
    }

    Ok(submissions)
}

fn submit_next<V: QueueView>(
    session: &mut UploadSession<V, FormTarget>,
    scheduler: &mut TokioScheduler,
    pending: &mut VecDeque<PathBuf>,
    posted: &mut HashMap<String, PathBuf>,
) -> UpqueueResult<()> {
    if !session.target().is_armed() {
        return Ok(());
    }

    if let Some(file) = pending.pop_front() {
        let frame = session.target_mut().submit(&file)?;
        posted.insert(frame, file);
        session.on_submit(scheduler);
    }

    Ok(())
}
