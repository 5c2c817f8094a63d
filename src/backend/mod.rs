//! Tutor backend boundary
//!
//! Everything the session engine needs from the outside world (topic
//! catalog, summary generation, streamed chat, quiz generation, OCR upload
//! and answer evaluation) sits behind the [`TutorBackend`] trait. The
//! production implementation is [`HttpBackend`]; tests substitute an
//! in-process fake.

pub mod http;
pub mod sse;
pub mod types;

pub use http::HttpBackend;
pub use types::{
    ChatMessage, ChatRequest, ErrorDetail, EvaluationResponse, ImageUploadResponse,
    QuestionKind, QuestionResult, QuizQuestion, QuizRequest, QuizResponse, SourceRef,
    SummaryRequest, SummaryResponse, Topic,
};

use crate::error::Result;
use futures::Stream;
use std::pin::Pin;

/// Stream of raw SSE data payloads for one chat turn
///
/// Each item is the string after the `data:` marker of one event frame;
/// parsing the JSON inside is the ingester's job. The stream ends on server
/// completion or transport closure.
pub type FrameStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// A quiz submission built by the session layer
#[derive(Debug, Clone)]
pub struct QuizSubmission {
    pub quiz_id: String,
    /// questionId -> answer text; serialized as a JSON object form field
    pub answers: std::collections::BTreeMap<String, String>,
    /// Evidence image forwarded alongside the answers, when attached
    pub evidence: Option<SubmissionFile>,
}

/// File content forwarded with a submission or upload
#[derive(Debug, Clone)]
pub struct SubmissionFile {
    pub file_name: String,
    /// MIME type determined by sniffing the image format locally
    pub mime: String,
    pub content: bytes::Bytes,
}

/// Contract for the tutor backend
///
/// All methods surface backend-reported failures as
/// `GurukulError::Backend(detail)` with the server's human-readable detail
/// string, and connection-level failures as `GurukulError::Transport`.
#[async_trait::async_trait]
pub trait TutorBackend: Send + Sync {
    /// List available class levels
    async fn list_classes(&self) -> Result<Vec<String>>;

    /// List topics, optionally filtered by class level
    async fn list_topics(&self, class_level: Option<&str>) -> Result<Vec<Topic>>;

    /// Generate a summary with key points for a topic
    async fn generate_summary(&self, request: &SummaryRequest) -> Result<SummaryResponse>;

    /// Open a streamed chat turn; the returned stream yields SSE data payloads
    async fn chat_stream(&self, request: &ChatRequest) -> Result<FrameStream>;

    /// Generate a quiz for a topic
    async fn generate_quiz(&self, request: &QuizRequest) -> Result<QuizResponse>;

    /// Upload an evidence image for OCR extraction
    async fn upload_image(&self, file: &SubmissionFile) -> Result<ImageUploadResponse>;

    /// Submit quiz answers (and optional evidence) for evaluation
    async fn evaluate_quiz(&self, submission: &QuizSubmission) -> Result<EvaluationResponse>;
}
