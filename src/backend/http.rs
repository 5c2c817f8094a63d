//! HTTP implementation of the tutor backend boundary
//!
//! Talks to the tutor service over reqwest. Non-success statuses carry a
//! JSON body `{"detail": "..."}`; the detail string is surfaced verbatim,
//! with a generic fallback when the body is missing or unparseable.

use crate::backend::{
    sse, ChatRequest, ErrorDetail, EvaluationResponse, FrameStream, ImageUploadResponse,
    QuizRequest, QuizResponse, QuizSubmission, SubmissionFile, SummaryRequest, SummaryResponse,
    Topic, TutorBackend,
};
use crate::config::BackendConfig;
use crate::error::{GurukulError, Result};

use reqwest::multipart;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

/// HTTP client for the tutor backend
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a new backend client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| GurukulError::Config(format!("Invalid backend URL: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("gurukul/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                GurukulError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!("Initialized tutor backend client: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| GurukulError::Config(format!("Invalid endpoint path {}: {}", path, e)).into())
    }

    /// Turn a non-success response into a backend error
    ///
    /// Reads the body and extracts the `detail` string when present.
    async fn error_from_response(response: Response) -> GurukulError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorDetail>(&body) {
            Ok(err) => GurukulError::Backend(err.detail),
            Err(_) => GurukulError::Backend(format!(
                "The tutor service returned an unexpected error (status {})",
                status.as_u16()
            )),
        }
    }

    async fn check(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from_response(response).await.into())
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| GurukulError::Transport(e.to_string()))?;
        Self::check(response).await
    }
}

#[async_trait::async_trait]
impl TutorBackend for HttpBackend {
    async fn list_classes(&self) -> Result<Vec<String>> {
        let url = self.endpoint("/api/topics/classes")?;
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    async fn list_topics(&self, class_level: Option<&str>) -> Result<Vec<Topic>> {
        let url = self.endpoint("/api/topics/")?;
        let mut request = self.client.get(url);
        if let Some(class_level) = class_level {
            request = request.query(&[("class_level", class_level)]);
        }
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn generate_summary(&self, request: &SummaryRequest) -> Result<SummaryResponse> {
        let url = self.endpoint("/api/summary/")?;
        let response = self.send(self.client.post(url).json(request)).await?;
        Ok(response.json().await?)
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<FrameStream> {
        let url = self.endpoint("/api/chat/stream")?;
        let response = self.send(self.client.post(url).json(request)).await?;

        // Frame parsing runs in a background task so the session layer sees
        // a plain stream of data payloads with a suspension point per frame.
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(sse::parse_sse_stream(response.bytes_stream(), tx));

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn generate_quiz(&self, request: &QuizRequest) -> Result<QuizResponse> {
        let url = self.endpoint("/api/quiz/")?;
        let response = self.send(self.client.post(url).json(request)).await?;
        Ok(response.json().await?)
    }

    async fn upload_image(&self, file: &SubmissionFile) -> Result<ImageUploadResponse> {
        let url = self.endpoint("/api/evaluation/upload-image")?;
        let part = multipart::Part::bytes(file.content.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|e| GurukulError::Transport(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self.send(self.client.post(url).multipart(form)).await?;
        Ok(response.json().await?)
    }

    async fn evaluate_quiz(&self, submission: &QuizSubmission) -> Result<EvaluationResponse> {
        let url = self.endpoint("/api/evaluation/evaluate")?;

        let answers_json = serde_json::to_string(&submission.answers)?;
        let mut form = multipart::Form::new()
            .text("quiz_id", submission.quiz_id.clone())
            .text("answers", answers_json);

        if let Some(file) = &submission.evidence {
            let part = multipart::Part::bytes(file.content.to_vec())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime)
                .map_err(|e| GurukulError::Transport(e.to_string()))?;
            form = form.part("file", part);
        }

        let response = self.send(self.client.post(url).multipart(form)).await?;
        Ok(response.json().await?)
    }
}
