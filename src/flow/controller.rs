//! Submission flow controller.
//!
//! Turns a validated draft into a persisted analysis with a strictly sequential pipeline:
//! persist workflow, acquire bot-verification token, request analysis, then two cosmetic
//! settle steps. Each transition goes through `SubmissionProgress::apply` and is published
//! on the optional event channel.

use super::progress::{Step, SubmissionProgress, SubmitEvent};
use crate::backend::Backend;
use crate::error::{ApiError, SubmitError};
use crate::model::{AnalyzeRequest, InfoEvent, WorkflowDraft, WorkflowId};
use crate::verification::{BotVerifier, ANALYZE_ACTION};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

const DEFAULT_RATE_LIMIT_MESSAGE: &str = "Analysis limit reached. Please try again later.";
const DEFAULT_SECURITY_MESSAGE: &str = "Security check failed. Please try again.";
const DEFAULT_CREATE_MESSAGE: &str = "Failed to create workflow";
const DEFAULT_ANALYZE_MESSAGE: &str = "Failed to analyze workflow";

/// How a submission that was not aborted ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed { workflow_id: WorkflowId },
    /// Informational, not an error. The flow stays frozen until `dismiss_rate_limit`.
    RateLimited { workflow_id: WorkflowId, message: String },
}

pub struct SubmissionController {
    backend: Arc<dyn Backend>,
    verifier: Arc<dyn BotVerifier>,
    settle_delay: Duration,
    progress: SubmissionProgress,
    event_tx: Option<UnboundedSender<SubmitEvent>>,
}

impl SubmissionController {
    pub fn new(backend: Arc<dyn Backend>, verifier: Arc<dyn BotVerifier>) -> Self {
        Self {
            backend,
            verifier,
            settle_delay: Duration::from_millis(400),
            progress: SubmissionProgress::default(),
            event_tx: None,
        }
    }

    /// Delay applied before each of the two cosmetic steps.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_events(mut self, event_tx: UnboundedSender<SubmitEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn progress(&self) -> &SubmissionProgress {
        &self.progress
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    fn emit(&mut self, ev: SubmitEvent) {
        self.progress.apply(&ev);
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ev);
        }
    }

    fn abort(&mut self, err: SubmitError) -> SubmitError {
        tracing::info!(kind = err.kind(), "submission aborted: {err}");
        self.emit(SubmitEvent::Aborted {
            message: err.to_string(),
        });
        err
    }

    /// Clear a pending rate-limit notice. Returns false when there was none.
    pub fn dismiss_rate_limit(&mut self) -> bool {
        if !self.progress.is_frozen() {
            return false;
        }
        self.emit(SubmitEvent::RateLimitDismissed);
        true
    }

    pub async fn submit(&mut self, draft: &WorkflowDraft) -> Result<SubmitOutcome, SubmitError> {
        if self.progress.is_frozen() {
            return Err(SubmitError::RateLimitPending);
        }
        // Every call starts from a fresh progress model, including one rejected locally.
        self.emit(SubmitEvent::Started);
        let payload = draft.to_payload()?;

        self.emit(SubmitEvent::StepStarted {
            step: Step::PersistWorkflow,
        });
        tracing::info!(tasks = payload.tasks.len(), "creating workflow {:?}", payload.name);
        let workflow = match self.backend.create_workflow(&payload).await {
            Ok(w) => w,
            Err(e @ ApiError::Status { .. }) => {
                return Err(self.abort(SubmitError::WorkflowCreation(
                    e.message_or(DEFAULT_CREATE_MESSAGE),
                )));
            }
            Err(e) => return Err(self.abort(SubmitError::Network(e.to_string()))),
        };
        let workflow_id = workflow.id;
        self.emit(SubmitEvent::Info(InfoEvent::WorkflowCreated {
            workflow_id: workflow_id.clone(),
        }));
        self.emit(SubmitEvent::StepCompleted {
            step: Step::PersistWorkflow,
        });

        self.emit(SubmitEvent::StepStarted {
            step: Step::VerifyHuman,
        });
        let token = match self.verifier.token(ANALYZE_ACTION).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("bot verification token unavailable: {e}");
                self.emit(SubmitEvent::Info(InfoEvent::TokenUnavailable {
                    reason: e.to_string(),
                }));
                String::new()
            }
        };
        self.emit(SubmitEvent::StepCompleted {
            step: Step::VerifyHuman,
        });

        self.emit(SubmitEvent::StepStarted {
            step: Step::RequestAnalysis,
        });
        let request = AnalyzeRequest {
            workflow_id: workflow_id.clone(),
            hourly_rate: draft.hourly_rate,
            recaptcha_token: token,
        };
        // A failed analysis leaves the created workflow in place; it shows up as "no analysis".
        match self.backend.analyze(&request).await {
            Ok(analysis) => {
                tracing::info!(
                    workflow_id = %workflow_id,
                    score = analysis.automation_score,
                    "analysis finished"
                );
            }
            Err(ApiError::Status {
                status: 429,
                message,
            }) => {
                let message = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_RATE_LIMIT_MESSAGE.to_string());
                tracing::info!(workflow_id = %workflow_id, "rate limited: {message}");
                self.emit(SubmitEvent::RateLimited {
                    message: message.clone(),
                });
                return Ok(SubmitOutcome::RateLimited {
                    workflow_id,
                    message,
                });
            }
            Err(e @ ApiError::Status { status: 403, .. }) => {
                return Err(self.abort(SubmitError::SecurityCheck(
                    e.message_or(DEFAULT_SECURITY_MESSAGE),
                )));
            }
            Err(e @ ApiError::Status { .. }) => {
                return Err(self.abort(SubmitError::Analysis(
                    e.message_or(DEFAULT_ANALYZE_MESSAGE),
                )));
            }
            Err(e) => return Err(self.abort(SubmitError::Network(e.to_string()))),
        }
        self.emit(SubmitEvent::StepCompleted {
            step: Step::RequestAnalysis,
        });

        for step in [Step::Finalize, Step::Complete] {
            self.emit(SubmitEvent::StepStarted { step });
            if !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }
            self.emit(SubmitEvent::StepCompleted { step });
        }

        self.emit(SubmitEvent::Completed {
            workflow_id: workflow_id.clone(),
        });
        Ok(SubmitOutcome::Completed { workflow_id })
    }
}
