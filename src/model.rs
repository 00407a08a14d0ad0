use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Client configuration resolved from CLI flags and environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_url: String,
    #[serde(default)]
    pub recaptcha_site_key: Option<String>,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
    #[serde(default)]
    pub recaptcha_token_cmd: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            recaptcha_site_key: None,
            recaptcha_token: None,
            recaptcha_token_cmd: None,
            timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(400),
            user_agent: format!("workscan/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Monthly,
    // `serde(other)` must be the last variant.
    #[default]
    #[serde(other)]
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    DataEntry,
    Communication,
    Analysis,
    Creative,
    Administrative,
    #[default]
    #[serde(other)]
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    High,
    #[default]
    #[serde(other)]
    Medium,
}

impl Frequency {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl Category {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "general" => Some(Self::General),
            "data_entry" => Some(Self::DataEntry),
            "communication" => Some(Self::Communication),
            "analysis" => Some(Self::Analysis),
            "creative" => Some(Self::Creative),
            "administrative" => Some(Self::Administrative),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::DataEntry => "data_entry",
            Self::Communication => "communication",
            Self::Analysis => "analysis",
            Self::Creative => "creative",
            Self::Administrative => "administrative",
        }
    }
}

impl Complexity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Default minutes per task occurrence for new drafts.
pub const DEFAULT_TIME_PER_TASK: u32 = 30;
/// Default hourly rate used for ROI display.
pub const DEFAULT_HOURLY_RATE: f64 = 50.0;

fn default_time_per_task() -> u32 {
    DEFAULT_TIME_PER_TASK
}

fn default_hourly_rate() -> f64 {
    DEFAULT_HOURLY_RATE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default = "default_time_per_task")]
    pub time_per_task: u32,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub complexity: Complexity,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            frequency: Frequency::default(),
            time_per_task: DEFAULT_TIME_PER_TASK,
            category: Category::default(),
            complexity: Complexity::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_hourly_rate")]
    pub hourly_rate: f64,
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}

impl Default for WorkflowDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            hourly_rate: DEFAULT_HOURLY_RATE,
            tasks: vec![TaskDraft::default()],
        }
    }
}

/// Opaque workflow identifier. Keeps the JSON type the backend used so it is echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowId {
    Int(i64),
    Str(String),
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowId::Int(n) => write!(f, "{n}"),
            WorkflowId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for WorkflowId {
    fn from(n: i64) -> Self {
        WorkflowId::Int(n)
    }
}

impl std::str::FromStr for WorkflowId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<i64>() {
            Ok(n) => WorkflowId::Int(n),
            Err(_) => WorkflowId::Str(s.to_string()),
        })
    }
}

/// Task as sent to the workflow-creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub name: String,
    pub description: String,
    pub frequency: Frequency,
    pub time_per_task: u32,
    pub category: Category,
    pub complexity: Complexity,
}

/// Body of `POST /api/workflows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPayload {
    pub name: String,
    pub description: String,
    pub tasks: Vec<TaskPayload>,
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub workflow_id: WorkflowId,
    pub hourly_rate: f64,
    pub recaptcha_token: String,
}

/// Task as stored by the backend. Every attribute is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub time_per_task: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub complexity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[serde(other)]
    Unknown,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Per-task analysis returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub task_id: Option<serde_json::Value>,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub task: Option<TaskSummary>,
    pub ai_readiness_score: f64,
    #[serde(default)]
    pub time_saved_percentage: Option<f64>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub estimated_hours_saved: Option<f64>,
}

impl TaskResult {
    /// Display name, falling back to the 1-based position.
    pub fn display_name(&self, index: usize) -> String {
        self.task
            .as_ref()
            .map(|t| t.name.trim())
            .filter(|n| !n.is_empty())
            .or_else(|| self.task_name.as_deref().map(str::trim).filter(|n| !n.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Task {}", index + 1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub workflow_id: WorkflowId,
    #[serde(default)]
    pub workflow: Option<Workflow>,
    pub automation_score: f64,
    #[serde(default)]
    pub hours_saved: Option<f64>,
    #[serde(default)]
    pub annual_savings: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub results: Vec<TaskResult>,
}

/// Output of the task extractor (`POST /api/parse-tasks`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedTasks {
    #[serde(default)]
    pub workflow_name: Option<String>,
    #[serde(default)]
    pub workflow_description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Docx,
    Pdf,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Docx => "docx",
            ReportFormat::Pdf => "pdf",
        }
    }
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    TokenUnavailable { reason: String },
    WorkflowCreated { workflow_id: WorkflowId },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::TokenUnavailable { reason } => {
                format!("Bot verification unavailable ({reason}); continuing without token")
            }
            InfoEvent::WorkflowCreated { workflow_id } => {
                format!("Workflow saved (id {workflow_id})")
            }
        }
    }
}
