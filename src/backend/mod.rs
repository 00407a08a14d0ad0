//! Interfaces to the remote analysis backend.
//!
//! The backend owns everything that needs judgement (task scoring, ROI, document and
//! audio parsing). This crate only fixes the shapes crossing the boundary.

mod envelope;
mod http;

pub use envelope::error_message;
pub use http::HttpBackend;

use crate::error::ApiError;
use crate::model::{
    AnalysisResult, AnalyzeRequest, ParsedTasks, ReportFormat, Workflow, WorkflowId,
    WorkflowPayload,
};
use async_trait::async_trait;
use bytes::Bytes;

/// Recorded audio ready for transcription.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub data: Bytes,
    pub file_name: String,
    pub mime: String,
}

/// A document uploaded for task extraction.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub data: Bytes,
    pub file_name: String,
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_workflow(&self, payload: &WorkflowPayload) -> Result<Workflow, ApiError>;

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Workflow, ApiError>;

    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError>;

    /// May fail with HTTP 429 (quota exhausted) or 403 (bot verification rejected).
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, ApiError>;

    async fn results(&self, id: &WorkflowId) -> Result<AnalysisResult, ApiError>;

    async fn transcribe(&self, clip: &AudioClip) -> Result<String, ApiError>;

    async fn extract_text(&self, doc: &DocumentUpload) -> Result<String, ApiError>;

    async fn parse_tasks(&self, text: &str) -> Result<ParsedTasks, ApiError>;

    async fn export_report(&self, id: &WorkflowId, format: ReportFormat)
        -> Result<Bytes, ApiError>;
}
