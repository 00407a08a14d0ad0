//! Submission progress model.
//!
//! One discriminated state instead of independent flags: a submission is either not
//! started, running a step, frozen on a rate-limit notice, or done. The controller and every
//! presentation layer drive their own copy through `apply`, so they cannot disagree.

use crate::model::{InfoEvent, WorkflowId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    PersistWorkflow,
    VerifyHuman,
    RequestAnalysis,
    Finalize,
    Complete,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::PersistWorkflow,
        Step::VerifyHuman,
        Step::RequestAnalysis,
        Step::Finalize,
        Step::Complete,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::PersistWorkflow => "Saving workflow",
            Step::VerifyHuman => "Verifying request",
            Step::RequestAnalysis => "Analyzing tasks",
            Step::Finalize => "Calculating ROI",
            Step::Complete => "Preparing results",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    NotStarted,
    Running(Step),
    /// Frozen at `step` until the user dismisses the notice.
    RateLimited { step: Step, message: String },
    Done,
}

/// Transitions published by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubmitEvent {
    Started,
    StepStarted { step: Step },
    StepCompleted { step: Step },
    RateLimited { message: String },
    RateLimitDismissed,
    Aborted { message: String },
    Completed { workflow_id: WorkflowId },
    Info(InfoEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionProgress {
    state: FlowState,
    completed_steps: BTreeSet<usize>,
    terminal_error: Option<String>,
}

impl Default for SubmissionProgress {
    fn default() -> Self {
        Self {
            state: FlowState::NotStarted,
            completed_steps: BTreeSet::new(),
            terminal_error: None,
        }
    }
}

impl SubmissionProgress {
    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Index of the current step, -1 when not started.
    pub fn current_step_index(&self) -> i32 {
        match &self.state {
            FlowState::NotStarted => -1,
            FlowState::Running(step) | FlowState::RateLimited { step, .. } => step.index() as i32,
            FlowState::Done => Step::Complete.index() as i32,
        }
    }

    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.completed_steps
    }

    pub fn is_step_completed(&self, step: Step) -> bool {
        self.completed_steps.contains(&step.index())
    }

    pub fn terminal_error(&self) -> Option<&str> {
        self.terminal_error.as_deref()
    }

    pub fn rate_limit_notice(&self) -> Option<&str> {
        match &self.state {
            FlowState::RateLimited { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, FlowState::Running(_))
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.state, FlowState::RateLimited { .. })
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, FlowState::Done)
    }

    /// Apply one transition. Events that are not legal in the current state are ignored;
    /// in particular nothing but `RateLimitDismissed` moves a frozen flow.
    pub fn apply(&mut self, ev: &SubmitEvent) {
        if self.is_frozen() && !matches!(ev, SubmitEvent::RateLimitDismissed | SubmitEvent::Info(_))
        {
            return;
        }
        match ev {
            SubmitEvent::Started => *self = Self::default(),
            SubmitEvent::StepStarted { step } => {
                if !self.is_done() {
                    self.state = FlowState::Running(*step);
                }
            }
            SubmitEvent::StepCompleted { step } => {
                if self.state == FlowState::Running(*step) {
                    self.completed_steps.insert(step.index());
                    if *step == Step::Complete {
                        self.state = FlowState::Done;
                    }
                }
            }
            SubmitEvent::RateLimited { message } => {
                if let FlowState::Running(step) = self.state {
                    self.state = FlowState::RateLimited {
                        step,
                        message: message.clone(),
                    };
                }
            }
            SubmitEvent::RateLimitDismissed => {
                if self.is_frozen() {
                    *self = Self::default();
                }
            }
            SubmitEvent::Aborted { message } => {
                *self = Self {
                    terminal_error: Some(message.clone()),
                    ..Self::default()
                };
            }
            SubmitEvent::Completed { .. } => {
                for step in Step::ALL {
                    self.completed_steps.insert(step.index());
                }
                self.state = FlowState::Done;
            }
            SubmitEvent::Info(_) => {}
        }
    }
}
