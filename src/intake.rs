//! Task intake: turn a document, a voice recording, or free text into draft tasks.
//!
//! Each path ends in the backend task extractor; the extracted tasks are applied to the
//! draft and the number of tasks added is returned.

use crate::backend::{Backend, DocumentUpload};
use crate::capture::{self, AudioCapture, CaptureError, SpeechRecognizer, TranscriptEvent};
use crate::error::ApiError;
use crate::model::WorkflowDraft;
use bytes::Bytes;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Failed to process document. Please try again or use manual input.")]
    Document(#[source] ApiError),

    #[error("could not read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process voice recording. Please try again or use manual input.")]
    Voice(#[source] CaptureError),

    #[error("Failed to extract tasks. Please try manual input.")]
    Extraction(#[source] ApiError),

    #[error("No text to extract tasks from")]
    EmptyText,

    #[error("No tasks were found in the input")]
    NoTasks,
}

async fn extract_into(
    backend: &dyn Backend,
    draft: &mut WorkflowDraft,
    text: &str,
) -> Result<usize, IntakeError> {
    if text.trim().is_empty() {
        return Err(IntakeError::EmptyText);
    }
    let parsed = backend
        .parse_tasks(text)
        .await
        .map_err(IntakeError::Extraction)?;
    let added = draft.apply_extracted(parsed);
    tracing::info!(added, "tasks extracted");
    if added == 0 {
        return Err(IntakeError::NoTasks);
    }
    Ok(added)
}

/// Free text straight to the extractor.
pub async fn from_text(
    backend: &dyn Backend,
    draft: &mut WorkflowDraft,
    text: &str,
) -> Result<usize, IntakeError> {
    extract_into(backend, draft, text).await
}

/// Upload a document, extract its text, then extract tasks from that text.
pub async fn from_document(
    backend: &dyn Backend,
    draft: &mut WorkflowDraft,
    path: &Path,
) -> Result<usize, IntakeError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| IntakeError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let upload = DocumentUpload {
        data: Bytes::from(data),
        file_name,
    };
    let text = backend
        .extract_text(&upload)
        .await
        .map_err(IntakeError::Document)?;
    extract_into(backend, draft, &text).await
}

/// Record from `capture` until `stop` is raised or the input ends, transcribe, then extract.
///
/// Recording runs on the blocking pool; the capture is released before transcription starts.
pub async fn from_voice(
    backend: &dyn Backend,
    recognizer: &dyn SpeechRecognizer,
    draft: &mut WorkflowDraft,
    mut capture: Box<dyn AudioCapture>,
    stop: Arc<AtomicBool>,
    transcript_tx: Option<&UnboundedSender<TranscriptEvent>>,
) -> Result<usize, IntakeError> {
    let clip = tokio::task::spawn_blocking(move || capture::record(capture.as_mut(), &stop))
        .await
        .map_err(|e| IntakeError::Voice(CaptureError::Read(std::io::Error::other(e))))?
        .map_err(IntakeError::Voice)?;
    let text = recognizer
        .recognize(&clip, transcript_tx)
        .await
        .map_err(IntakeError::Voice)?;
    extract_into(backend, draft, &text).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AudioClip;
    use crate::capture::fakes::FakeCapture;
    use crate::capture::RemoteRecognizer;
    use crate::model::{
        AnalysisResult, AnalyzeRequest, Frequency, ParsedTasks, ReportFormat, TaskDraft,
        Workflow, WorkflowId, WorkflowPayload,
    };
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ExtractorBackend {
        parse_inputs: Mutex<Vec<String>>,
        uploads: Mutex<Vec<(String, String, usize)>>,
        fail_extract: bool,
    }

    #[async_trait]
    impl Backend for ExtractorBackend {
        async fn create_workflow(&self, _: &WorkflowPayload) -> Result<Workflow, ApiError> {
            unimplemented!()
        }
        async fn get_workflow(&self, _: &WorkflowId) -> Result<Workflow, ApiError> {
            unimplemented!()
        }
        async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
            unimplemented!()
        }
        async fn analyze(&self, _: &AnalyzeRequest) -> Result<AnalysisResult, ApiError> {
            unimplemented!()
        }
        async fn results(&self, _: &WorkflowId) -> Result<AnalysisResult, ApiError> {
            unimplemented!()
        }
        async fn transcribe(&self, clip: &AudioClip) -> Result<String, ApiError> {
            self.uploads.lock().unwrap().push((
                clip.file_name.clone(),
                clip.mime.clone(),
                clip.data.len(),
            ));
            Ok("We post on social media every day".into())
        }
        async fn extract_text(&self, doc: &DocumentUpload) -> Result<String, ApiError> {
            if self.fail_extract {
                return Err(ApiError::Status {
                    status: 500,
                    message: None,
                });
            }
            Ok(String::from_utf8_lossy(&doc.data).into_owned())
        }
        async fn parse_tasks(&self, text: &str) -> Result<ParsedTasks, ApiError> {
            self.parse_inputs.lock().unwrap().push(text.to_string());
            let mut task = TaskDraft::named("Post on social media");
            task.frequency = Frequency::Daily;
            Ok(ParsedTasks {
                workflow_name: Some("Social".into()),
                workflow_description: None,
                tasks: vec![task],
            })
        }
        async fn export_report(&self, _: &WorkflowId, _: ReportFormat) -> Result<Bytes, ApiError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn text_is_parsed_and_applied() {
        let backend = ExtractorBackend::default();
        let mut draft = WorkflowDraft::default();
        let n = from_text(&backend, &mut draft, "post daily").await.unwrap();
        assert_eq!(n, 1);
        assert_eq!(draft.name, "Social");
        assert!(draft.valid_tasks().any(|t| t.name == "Post on social media"));
    }

    #[tokio::test]
    async fn blank_text_makes_no_call() {
        let backend = ExtractorBackend::default();
        let mut draft = WorkflowDraft::default();
        let err = from_text(&backend, &mut draft, "   ").await.unwrap_err();
        assert!(matches!(err, IntakeError::EmptyText));
        assert!(backend.parse_inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn document_text_feeds_the_extractor() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"Every Monday we reconcile invoices").unwrap();
        let backend = ExtractorBackend::default();
        let mut draft = WorkflowDraft::default();
        from_document(&backend, &mut draft, f.path()).await.unwrap();
        assert_eq!(
            backend.parse_inputs.lock().unwrap().as_slice(),
            ["Every Monday we reconcile invoices"]
        );
    }

    #[tokio::test]
    async fn document_failure_uses_user_message() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let backend = ExtractorBackend {
            fail_extract: true,
            ..Default::default()
        };
        let mut draft = WorkflowDraft::default();
        let err = from_document(&backend, &mut draft, f.path()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to process document. Please try again or use manual input."
        );
    }

    #[tokio::test]
    async fn voice_records_transcribes_and_releases_input() {
        let backend = Arc::new(ExtractorBackend::default());
        let recognizer = RemoteRecognizer::new(backend.clone());
        let capture = FakeCapture::new(vec![Ok("chunk-1"), Ok("chunk-2")]);
        let closes = capture.closes.clone();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut draft = WorkflowDraft::default();

        let n = from_voice(
            backend.as_ref(),
            &recognizer,
            &mut draft,
            Box::new(capture),
            Arc::new(AtomicBool::new(false)),
            Some(&tx),
        )
        .await
        .unwrap();

        assert_eq!(n, 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        let uploads = backend.uploads.lock().unwrap().clone();
        assert_eq!(uploads, [("recording.webm".to_string(), "audio/webm".to_string(), 14)]);
        assert_eq!(
            rx.try_recv().unwrap(),
            TranscriptEvent::Final("We post on social media every day".into())
        );
    }

    #[tokio::test]
    async fn voice_capture_error_releases_input() {
        let backend = Arc::new(ExtractorBackend::default());
        let recognizer = RemoteRecognizer::new(backend.clone());
        let capture = FakeCapture::new(vec![Err(std::io::ErrorKind::Interrupted)]);
        let closes = capture.closes.clone();
        let mut draft = WorkflowDraft::default();

        let err = from_voice(
            backend.as_ref(),
            &recognizer,
            &mut draft,
            Box::new(capture),
            Arc::new(AtomicBool::new(false)),
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to process voice recording. Please try again or use manual input."
        );
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(backend.uploads.lock().unwrap().is_empty());
    }
}
