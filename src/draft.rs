//! Workflow draft editing and validation.
//!
//! A draft is what the user has typed (or what the extractor produced) before anything is
//! sent to the backend. `to_payload` is the single gate between the two: it validates and
//! drops tasks without a name.

use crate::error::SubmitError;
use crate::model::{
    Category, Complexity, Frequency, ParsedTasks, TaskDraft, TaskPayload, WorkflowDraft,
    WorkflowPayload, DEFAULT_TIME_PER_TASK,
};
use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use std::str::FromStr;

impl TaskDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    fn to_payload(&self) -> TaskPayload {
        let description = if self.description.trim().is_empty() {
            self.name.clone()
        } else {
            self.description.clone()
        };
        TaskPayload {
            name: self.name.clone(),
            description,
            frequency: self.frequency,
            time_per_task: self.time_per_task,
            category: self.category,
            complexity: self.complexity,
        }
    }
}

/// Compact task spec: `name[:frequency[:minutes[:category[:complexity]]]]`.
///
/// Empty fields keep their defaults, so `"Write posts::45"` only sets the duration.
impl FromStr for TaskDraft {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        let mut task = TaskDraft::named(parts.next().unwrap_or_default().trim());
        if !task.is_valid() {
            bail!("task name must not be empty in {s:?}");
        }

        if let Some(f) = parts.next().filter(|p| !p.trim().is_empty()) {
            task.frequency = Frequency::parse(f)
                .ok_or_else(|| anyhow!("unknown frequency {f:?} (daily, weekly, monthly)"))?;
        }
        if let Some(m) = parts.next().filter(|p| !p.trim().is_empty()) {
            let minutes: u32 = m
                .trim()
                .parse()
                .with_context(|| format!("invalid minutes {m:?}"))?;
            if minutes == 0 {
                bail!("minutes per task must be positive");
            }
            task.time_per_task = minutes;
        }
        if let Some(c) = parts.next().filter(|p| !p.trim().is_empty()) {
            task.category = Category::parse(c).ok_or_else(|| {
                anyhow!("unknown category {c:?} (general, data_entry, communication, analysis, creative, administrative)")
            })?;
        }
        if let Some(c) = parts.next().filter(|p| !p.trim().is_empty()) {
            task.complexity = Complexity::parse(c)
                .ok_or_else(|| anyhow!("unknown complexity {c:?} (low, medium, high)"))?;
        }
        if parts.next().is_some() {
            bail!("too many ':' separated fields in {s:?}");
        }
        Ok(task)
    }
}

impl WorkflowDraft {
    /// Empty draft without the placeholder task row.
    pub fn empty() -> Self {
        Self {
            tasks: Vec::new(),
            ..Default::default()
        }
    }

    pub fn add_task(&mut self) -> &mut TaskDraft {
        self.tasks.push(TaskDraft::default());
        let last = self.tasks.len() - 1;
        &mut self.tasks[last]
    }

    /// Remove a task. The last remaining row is never removed.
    pub fn remove_task(&mut self, index: usize) -> bool {
        if self.tasks.len() <= 1 || index >= self.tasks.len() {
            return false;
        }
        self.tasks.remove(index);
        true
    }

    pub fn valid_tasks(&self) -> impl Iterator<Item = &TaskDraft> {
        self.tasks.iter().filter(|t| t.is_valid())
    }

    /// Local precondition for submission. No network call may happen if this fails.
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.name.trim().is_empty() {
            return Err(SubmitError::Validation(
                "Please provide a workflow name".into(),
            ));
        }
        if self.valid_tasks().next().is_none() {
            return Err(SubmitError::Validation("Please add at least one task".into()));
        }
        if let Some(t) = self.valid_tasks().find(|t| t.time_per_task == 0) {
            return Err(SubmitError::Validation(format!(
                "Time per task must be at least 1 minute ({})",
                t.name.trim()
            )));
        }
        if !(self.hourly_rate.is_finite() && self.hourly_rate > 0.0) {
            return Err(SubmitError::Validation(
                "Hourly rate must be a positive number".into(),
            ));
        }
        Ok(())
    }

    /// Validate and build the creation payload. Tasks without a name are dropped; the rest keep
    /// their order.
    pub fn to_payload(&self) -> Result<WorkflowPayload, SubmitError> {
        self.validate()?;
        Ok(WorkflowPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            tasks: self.valid_tasks().map(TaskDraft::to_payload).collect(),
        })
    }

    /// Merge extractor output into the draft. Returns the number of tasks applied; zero means
    /// the draft was left untouched.
    pub fn apply_extracted(&mut self, parsed: ParsedTasks) -> usize {
        if parsed.tasks.is_empty() {
            return 0;
        }
        let n = parsed.tasks.len();
        self.tasks = parsed.tasks;
        for t in self.tasks.iter_mut().filter(|t| t.time_per_task == 0) {
            t.time_per_task = DEFAULT_TIME_PER_TASK;
        }
        if let Some(name) = parsed.workflow_name.filter(|s| !s.trim().is_empty()) {
            self.name = name;
        }
        if let Some(desc) = parsed.workflow_description.filter(|s| !s.trim().is_empty()) {
            self.description = desc;
        }
        n
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read draft {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse draft {}", path.display()))
    }
}
