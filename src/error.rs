//! Error taxonomy for the submission flow and the backend client.

use thiserror::Error;

/// Failure of a remote call to the analysis backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-success HTTP status. `message` is the human text from the error envelope, if any.
    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided message, or `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Why a submission attempt was aborted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(String),

    #[error("A rate-limit notice is still open; dismiss it before submitting again")]
    RateLimitPending,

    #[error("{0}")]
    WorkflowCreation(String),

    #[error("{0}")]
    SecurityCheck(String),

    #[error("{0}")]
    Analysis(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl SubmitError {
    /// Short machine-friendly kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::Validation(_) => "validation",
            SubmitError::RateLimitPending => "rate_limit_pending",
            SubmitError::WorkflowCreation(_) => "workflow_creation",
            SubmitError::SecurityCheck(_) => "security_check",
            SubmitError::Analysis(_) => "analysis",
            SubmitError::Network(_) => "network",
        }
    }
}
