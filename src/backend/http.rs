use super::{envelope, AudioClip, Backend, DocumentUpload};
use crate::error::ApiError;
use crate::model::{
    AnalysisResult, AnalyzeRequest, ClientConfig, ParsedTasks, ReportFormat, Workflow,
    WorkflowId, WorkflowPayload,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use rand::RngCore;
use reqwest::{multipart, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// reqwest-backed client for the WorkScanAI REST API.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
}

/// Random per-request id so backend logs can be correlated with ours.
fn gen_request_id() -> String {
    let mut b = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut b);
    format!("{:016x}", u64::from_le_bytes(b))
}

impl HttpBackend {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let mut base = cfg.api_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).with_context(|| format!("invalid API URL {base:?}"))?;
        let http = reqwest::Client::builder()
            .user_agent(&cfg.user_agent)
            .timeout(cfg.timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Url {
        // Base always ends with '/', so join never drops a path prefix.
        self.base_url
            .join(path.trim_start_matches('/'))
            .unwrap_or_else(|_| self.base_url.clone())
    }

    async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> Result<Response, ApiError> {
        let request_id = gen_request_id();
        tracing::debug!(%request_id, "{what}");
        let resp = req.header("X-Request-Id", &request_id).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = envelope::error_message(&body);
        tracing::debug!(%request_id, status = status.as_u16(), ?message, "{what} failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .send(self.http.get(self.url(path)), &format!("GET {path}"))
            .await?;
        Self::json(resp).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .send(
                self.http.post(self.url(path)).json(body),
                &format!("POST {path}"),
            )
            .await?;
        Self::json(resp).await
    }

    async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T, ApiError> {
        let resp = self
            .send(
                self.http.post(self.url(path)).multipart(form),
                &format!("POST {path} (multipart)"),
            )
            .await?;
        Self::json(resp).await
    }
}

#[derive(serde::Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    transcription: String,
}

#[derive(serde::Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_workflow(&self, payload: &WorkflowPayload) -> Result<Workflow, ApiError> {
        self.post_json("api/workflows", payload).await
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Workflow, ApiError> {
        self.get_json(&format!("api/workflows/{id}")).await
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
        self.get_json("api/workflows").await
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, ApiError> {
        self.post_json("api/analyze", request).await
    }

    async fn results(&self, id: &WorkflowId) -> Result<AnalysisResult, ApiError> {
        self.get_json(&format!("api/results/{id}")).await
    }

    async fn transcribe(&self, clip: &AudioClip) -> Result<String, ApiError> {
        let part = multipart::Part::stream(clip.data.clone())
            .file_name(clip.file_name.clone())
            .mime_str(&clip.mime)?;
        let form = multipart::Form::new().part("audio", part);
        let resp: TranscribeResponse = self.post_multipart("api/transcribe", form).await?;
        Ok(resp.transcription)
    }

    async fn extract_text(&self, doc: &DocumentUpload) -> Result<String, ApiError> {
        let part = multipart::Part::stream(doc.data.clone()).file_name(doc.file_name.clone());
        let form = multipart::Form::new().part("file", part);
        let resp: ExtractResponse = self.post_multipart("api/extract-tasks", form).await?;
        Ok(resp.text)
    }

    async fn parse_tasks(&self, text: &str) -> Result<ParsedTasks, ApiError> {
        self.post_json("api/parse-tasks", &serde_json::json!({ "text": text }))
            .await
    }

    async fn export_report(
        &self,
        id: &WorkflowId,
        format: ReportFormat,
    ) -> Result<Bytes, ApiError> {
        let path = format!("api/reports/{id}/{}", format.extension());
        let resp = self
            .send(self.http.get(self.url(&path)), &format!("GET {path}"))
            .await?;
        Ok(resp.bytes().await?)
    }
}
