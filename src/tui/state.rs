use crate::error::SubmitError;
use crate::flow::session::SessionEvent;
use crate::flow::{SubmissionProgress, SubmitEvent, SubmitOutcome};
use crate::model::{WorkflowDraft, WorkflowId};
use crate::report::{build_roadmap, ResultsView, Roadmap};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

pub const TAB_PROGRESS: usize = 0;
pub const TAB_RESULTS: usize = 1;
pub const TAB_ROADMAP: usize = 2;
pub const TAB_HELP: usize = 3;
pub const TAB_COUNT: usize = 4;

pub struct UiState {
    pub tab: usize,
    pub info: String,

    pub workflow_name: String,
    pub task_count: usize,
    pub hourly_rate: f64,

    /// Mirror of the controller's progress, driven by the same events.
    pub progress: SubmissionProgress,
    pub workflow_id: Option<WorkflowId>,
    pub submitting: bool,

    pub results: Option<ResultsView>,
    pub roadmap: Option<Roadmap>,
}

impl UiState {
    pub fn for_draft(draft: &WorkflowDraft) -> Self {
        Self {
            tab: TAB_PROGRESS,
            info: String::new(),
            workflow_name: draft.name.clone(),
            task_count: draft.valid_tasks().count(),
            hourly_rate: draft.hourly_rate,
            progress: SubmissionProgress::default(),
            workflow_id: None,
            submitting: false,
            results: None,
            roadmap: None,
        }
    }
}

pub fn apply_event(state: &mut UiState, ev: SessionEvent) {
    match ev {
        SessionEvent::Flow(ev) => {
            state.progress.apply(&ev);
            match ev {
                SubmitEvent::Started => {
                    state.submitting = true;
                    state.workflow_id = None;
                    state.results = None;
                    state.roadmap = None;
                    state.info = "Submitting…".into();
                }
                SubmitEvent::StepStarted { step } => state.info = format!("{}…", step.label()),
                SubmitEvent::Info(info) => {
                    if let crate::model::InfoEvent::WorkflowCreated { workflow_id } = &info {
                        state.workflow_id = Some(workflow_id.clone());
                    }
                    state.info = info.to_message();
                }
                SubmitEvent::RateLimitDismissed => state.info = "Notice dismissed".into(),
                _ => {}
            }
        }
        SessionEvent::Finished(outcome) => {
            state.submitting = false;
            state.info = match outcome {
                Ok(SubmitOutcome::Completed { workflow_id }) => {
                    state.workflow_id = Some(workflow_id);
                    "Analysis complete, loading results…".into()
                }
                Ok(SubmitOutcome::RateLimited { .. }) => {
                    "Rate limited. Press d to dismiss the notice.".into()
                }
                Err(SubmitError::Validation(msg)) => msg,
                Err(e) => format!("Submission failed ({})", e.kind()),
            };
        }
        SessionEvent::Results(view) => {
            state.roadmap = Some(build_roadmap(&view.analysis));
            state.results = Some(*view);
            state.tab = TAB_RESULTS;
            state.info = "Results ready".into();
        }
        SessionEvent::Message(msg) => state.info = msg,
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}
