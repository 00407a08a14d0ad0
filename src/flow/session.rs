//! Submission session loop.
//!
//! Owns submit/dismiss/quit orchestration for interactive front ends and emits events for
//! presentation layers.

use super::controller::{SubmissionController, SubmitOutcome};
use super::progress::SubmitEvent;
use crate::error::{ApiError, SubmitError};
use crate::model::WorkflowDraft;
use crate::report::{load_results, ResultsView};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers to control the session.
#[derive(Debug, Clone)]
pub enum UiCommand {
    Submit,
    DismissNotice,
    Quit,
}

/// Everything a presentation layer needs to render the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Flow(SubmitEvent),
    /// Final submission outcome, after all of its flow events.
    Finished(std::result::Result<SubmitOutcome, SubmitError>),
    Results(Box<ResultsView>),
    Message(String),
}

/// What a finished submission task hands back to the loop.
struct RunOutput {
    controller: SubmissionController,
    outcome: std::result::Result<SubmitOutcome, SubmitError>,
    results: Option<std::result::Result<ResultsView, ApiError>>,
}

type RunHandle = tokio::task::JoinHandle<RunOutput>;

/// Move the controller into a task for one submission. Results are fetched in the same task
/// so the loop keeps serving commands meanwhile.
fn start_run(mut controller: SubmissionController, draft: WorkflowDraft) -> RunHandle {
    tokio::spawn(async move {
        let outcome = controller.submit(&draft).await;
        let results = match &outcome {
            Ok(SubmitOutcome::Completed { workflow_id }) => {
                let backend = controller.backend().clone();
                Some(load_results(backend.as_ref(), workflow_id).await)
            }
            _ => None,
        };
        RunOutput {
            controller,
            outcome,
            results,
        }
    })
}

fn forward_pending(flow_rx: &mut UnboundedReceiver<SubmitEvent>, event_tx: &UnboundedSender<SessionEvent>) {
    while let Ok(ev) = flow_rx.try_recv() {
        let _ = event_tx.send(SessionEvent::Flow(ev));
    }
}

/// Drive submissions from UI commands until `Quit` or the command channel closes.
///
/// The controller must not already carry an event sender; the session installs its own.
pub async fn run_session(
    controller: SubmissionController,
    draft: WorkflowDraft,
    submit_on_launch: bool,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let (flow_tx, mut flow_rx) = tokio::sync::mpsc::unbounded_channel::<SubmitEvent>();
    let mut idle: Option<SubmissionController> = Some(controller.with_events(flow_tx));
    let mut in_flight: Option<RunHandle> = None;

    if submit_on_launch {
        if let Some(c) = idle.take() {
            in_flight = Some(start_run(c, draft.clone()));
        }
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit) => {
                        let Some(c) = idle.take() else {
                            let _ = event_tx.send(SessionEvent::Message(
                                "A submission is already running".into(),
                            ));
                            continue;
                        };
                        if c.progress().is_frozen() {
                            let _ = event_tx.send(SessionEvent::Message(
                                SubmitError::RateLimitPending.to_string(),
                            ));
                            idle = Some(c);
                            continue;
                        }
                        in_flight = Some(start_run(c, draft.clone()));
                    }
                    Some(UiCommand::DismissNotice) => {
                        if let Some(c) = idle.as_mut() {
                            c.dismiss_rate_limit();
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // Abandon an in-flight submission; whatever the backend already
                        // persisted stays persisted.
                        if let Some(h) = in_flight.take() {
                            h.abort();
                        }
                        break;
                    }
                }
            }
            Some(ev) = flow_rx.recv() => {
                let _ = event_tx.send(SessionEvent::Flow(ev));
            }
            // Do not take the JoinHandle before this branch wins; otherwise it is dropped
            // when another branch is chosen and completion is never observed.
            maybe_done = async {
                if let Some(h) = in_flight.as_mut() {
                    return Some(h.await);
                }
                futures::future::pending().await
            } => {
                in_flight = None;
                // Flow events precede the outcome they led to.
                forward_pending(&mut flow_rx, &event_tx);
                match maybe_done {
                    Some(Ok(out)) => {
                        let _ = event_tx.send(SessionEvent::Finished(out.outcome));
                        match out.results {
                            Some(Ok(view)) => {
                                let _ = event_tx.send(SessionEvent::Results(Box::new(view)));
                            }
                            Some(Err(e)) => {
                                let _ = event_tx.send(SessionEvent::Message(format!(
                                    "Could not load results: {e}"
                                )));
                            }
                            None => {}
                        }
                        idle = Some(out.controller);
                    }
                    Some(Err(e)) => {
                        // The controller went down with the task; nothing left to submit with.
                        let _ = event_tx.send(SessionEvent::Message(format!(
                            "Submission task failed: {e}"
                        )));
                        break;
                    }
                    None => {}
                }
            }
        }
    }

    Ok(())
}
