//! Session orchestration
//!
//! `Session` ties the timeline, the quiz lifecycle and the backend together
//! and enforces single-flight: at most one network-mutating operation runs
//! at a time, guarded by one coarse `busy` flag. A second trigger while busy
//! fails fast and touches nothing. The separate `streaming` flag only marks
//! that a chat turn is rendering live; it gates nothing.
//!
//! Every network operation appends its entries optimistically before the
//! request goes out, so the timeline always shows what the student asked
//! for, and failure paths relabel the pending entry instead of dropping it.

use crate::backend::{
    ChatMessage, ChatRequest, QuizRequest, SubmissionFile, SummaryRequest, Topic, TutorBackend,
};
use crate::config::Config;
use crate::error::{GurukulError, Result};
use crate::session::ingest::{IngestOutcome, StreamIngester, CHAT_FAILURE_MESSAGE};
use crate::session::quiz::{EvidenceFile, QuizState};
use crate::session::reconcile::merge_extracted_answers;
use crate::session::timeline::{ConversationEntry, EntryBody, EntryId, Role, Timeline};

use bytes::Bytes;
use futures::StreamExt;
use std::sync::Arc;

/// Shown in place of a summary when generation fails
pub const SUMMARY_FAILURE_MESSAGE: &str =
    "Sorry, the summary could not be generated. Please try again.";

/// Shown in place of a quiz when generation fails
pub const QUIZ_FAILURE_MESSAGE: &str =
    "Sorry, the quiz could not be generated. Please try again.";

/// The topic the session is currently studying
#[derive(Debug, Clone)]
pub struct SelectedTopic {
    pub topic_id: String,
    pub topic_name: String,
    pub class_level: String,
}

impl From<&Topic> for SelectedTopic {
    fn from(t: &Topic) -> Self {
        Self {
            topic_id: t.topic_id.clone(),
            topic_name: t.topic_name.clone(),
            class_level: t.class_level.clone(),
        }
    }
}

/// Result of a submission attempt that went through the local preconditions
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The evaluation was bound to the entry with this id
    Evaluated(EntryId),
    /// Nothing to grade: no answers and no evidence; no request was made
    NothingToSubmit,
}

/// One student's study session
pub struct Session {
    backend: Arc<dyn TutorBackend>,
    config: Config,
    timeline: Timeline,
    topic: Option<SelectedTopic>,
    /// The quiz currently accepting answers: (owning entry, quiz id)
    active_quiz: Option<(EntryId, String)>,
    busy: bool,
    streaming: bool,
}

impl Session {
    /// Create a session against the given backend
    pub fn new(backend: Arc<dyn TutorBackend>, config: Config) -> Self {
        Self {
            backend,
            config,
            timeline: Timeline::new(),
            topic: None,
            active_quiz: None,
            busy: false,
            streaming: false,
        }
    }

    /// A consistent view of the conversation so far
    pub fn snapshot(&self) -> Arc<Vec<ConversationEntry>> {
        self.timeline.snapshot()
    }

    /// The currently selected topic, if any
    pub fn topic(&self) -> Option<&SelectedTopic> {
        self.topic.as_ref()
    }

    /// True while a network operation is in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// True while a chat answer is streaming in
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// The quiz currently accepting answers, if any
    pub fn active_quiz(&self) -> Option<&QuizState> {
        let (entry_id, _) = self.active_quiz.as_ref()?;
        match &self.timeline.get(*entry_id)?.body {
            EntryBody::Quiz { quiz, .. } => Some(quiz),
            _ => None,
        }
    }

    /// Map a 1-based question number on the active quiz to its question id
    pub fn question_id_for(&self, number: usize) -> Option<String> {
        let quiz = self.active_quiz()?;
        quiz.questions
            .get(number.checked_sub(1)?)
            .map(|q| q.id.clone())
    }

    /// Switch to a new topic
    ///
    /// Retires the whole conversation: the timeline, all quiz state and the
    /// active quiz context are cleared before the new topic is stored.
    pub fn select_topic(&mut self, topic: &Topic) {
        tracing::info!("Switching topic to {} ({})", topic.topic_name, topic.topic_id);
        self.timeline.clear();
        self.active_quiz = None;
        self.topic = Some(SelectedTopic::from(topic));
    }

    fn begin_network(&mut self) -> Result<()> {
        if self.busy {
            return Err(GurukulError::Busy.into());
        }
        self.busy = true;
        Ok(())
    }

    fn selected_topic(&self) -> Result<SelectedTopic> {
        self.topic
            .clone()
            .ok_or_else(|| GurukulError::NoTopicSelected.into())
    }

    /// Request a summary of the selected topic
    ///
    /// Appends the request and a pending answer entry before the call; on
    /// success the pending entry becomes the summary, on failure it is
    /// relabeled with a fixed failure message and the error is returned.
    pub async fn request_summary(&mut self) -> Result<EntryId> {
        let topic = self.selected_topic()?;
        self.begin_network()?;

        let request = SummaryRequest {
            topic_id: topic.topic_id,
            topic_name: topic.topic_name.clone(),
            class_level: topic.class_level,
        };

        self.timeline.append(
            Role::User,
            EntryBody::plain(format!("Summarize \"{}\" for me.", topic.topic_name)),
        );
        let pending = self.timeline.append(Role::Assistant, EntryBody::plain(""));

        let result = self.backend.generate_summary(&request).await;
        self.busy = false;

        match result {
            Ok(response) => {
                self.timeline.update_by_id(pending, |entry| {
                    entry.body = EntryBody::Summary {
                        content: response.summary.clone(),
                        key_points: response.key_points.clone(),
                    };
                });
                Ok(pending)
            }
            Err(e) => {
                self.timeline.update_by_id(pending, |entry| {
                    entry.body = EntryBody::plain(SUMMARY_FAILURE_MESSAGE);
                });
                Err(e)
            }
        }
    }

    /// Send a chat message and stream the answer into the timeline
    ///
    /// `on_delta` is called once per received chunk so the caller can render
    /// the answer live. The final entry content is whatever the server
    /// declares authoritative, regardless of the deltas shown.
    pub async fn send_chat(
        &mut self,
        text: &str,
        mut on_delta: impl FnMut(&str),
    ) -> Result<EntryId> {
        let topic = self.selected_topic()?;
        self.begin_network()?;

        self.timeline.append(Role::User, EntryBody::plain(text));

        let request = ChatRequest {
            topic_id: topic.topic_id,
            topic_name: topic.topic_name,
            class_level: topic.class_level,
            messages: self.chat_history(),
        };

        let pending = self.timeline.append(Role::Assistant, EntryBody::plain(""));

        let stream = match self.backend.chat_stream(&request).await {
            Ok(s) => s,
            Err(e) => {
                // Transport failed before any frame arrived.
                self.timeline.update_by_id(pending, |entry| {
                    entry.body = EntryBody::plain(CHAT_FAILURE_MESSAGE);
                });
                self.busy = false;
                return Err(e);
            }
        };

        self.streaming = true;
        let mut ingester = StreamIngester::new(pending);

        let mut stream = stream;
        while let Some(frame) = stream.next().await {
            match ingester.apply_frame(&mut self.timeline, &frame) {
                IngestOutcome::Delta(delta) => on_delta(&delta),
                IngestOutcome::Finalized | IngestOutcome::Failed => break,
                IngestOutcome::Ignored => {}
            }
        }
        ingester.finish(&mut self.timeline);

        self.streaming = false;
        self.busy = false;
        Ok(pending)
    }

    /// Chat history for the backend, oldest first
    ///
    /// Only plain conversational entries participate; summaries, quizzes
    /// and failure-labeled entries are not part of the dialogue the model
    /// should continue.
    fn chat_history(&self) -> Vec<ChatMessage> {
        self.timeline
            .snapshot()
            .iter()
            .filter_map(|entry| match &entry.body {
                EntryBody::Plain { content, .. }
                    if !content.is_empty() && !is_failure_label(content) =>
                {
                    Some(ChatMessage {
                        role: match entry.role {
                            Role::User => "user".to_string(),
                            Role::Assistant => "assistant".to_string(),
                        },
                        content: content.clone(),
                    })
                }
                _ => None,
            })
            .collect()
    }

    /// Generate a quiz on the selected topic
    ///
    /// `counts` overrides the configured default composition. On success the
    /// new quiz becomes the active context; previously evaluated quizzes in
    /// the timeline are untouched.
    pub async fn generate_quiz(&mut self, counts: Option<(u32, u32, u32)>) -> Result<EntryId> {
        let topic = self.selected_topic()?;
        let (num_mcqs, num_fill_blank, num_short_answer) = counts.unwrap_or((
            self.config.quiz.num_mcqs,
            self.config.quiz.num_fill_blank,
            self.config.quiz.num_short_answer,
        ));
        validate_quiz_counts(num_mcqs, num_fill_blank, num_short_answer)?;
        self.begin_network()?;

        let request = QuizRequest {
            topic_id: topic.topic_id,
            topic_name: topic.topic_name.clone(),
            class_level: topic.class_level,
            num_mcqs,
            num_fill_blank,
            num_short_answer,
        };

        self.timeline.append(
            Role::User,
            EntryBody::plain(format!("Quiz me on \"{}\".", topic.topic_name)),
        );
        let pending = self.timeline.append(Role::Assistant, EntryBody::plain(""));

        let result = self.backend.generate_quiz(&request).await;
        self.busy = false;

        match result {
            Ok(response) => {
                let quiz = QuizState::from_response(response);
                let quiz_id = quiz.quiz_id.clone();
                self.timeline.update_by_id(pending, |entry| {
                    entry.body = EntryBody::Quiz {
                        quiz,
                        evaluation: None,
                    };
                });
                self.active_quiz = Some((pending, quiz_id));
                Ok(pending)
            }
            Err(e) => {
                self.timeline.update_by_id(pending, |entry| {
                    entry.body = EntryBody::plain(QUIZ_FAILURE_MESSAGE);
                });
                Err(e)
            }
        }
    }

    /// Record an answer on the active quiz; last write wins
    ///
    /// Local only: not gated by the busy flag.
    pub fn set_answer(&mut self, question_id: &str, text: &str) -> Result<()> {
        let entry_id = self
            .active_quiz
            .as_ref()
            .ok_or(GurukulError::NoActiveQuiz)?
            .0;
        self.timeline.update_by_id(entry_id, |entry| {
            if let EntryBody::Quiz { quiz, .. } = &mut entry.body {
                quiz.set_answer(question_id, text);
            }
        });
        Ok(())
    }

    /// Upload an answer-sheet image and merge its extracted answers
    ///
    /// The file must be a readable image and within the configured size
    /// limit; both are checked before any request. A failed upload leaves
    /// the quiz exactly as it was. Returns the number of answers filled in
    /// from the extracted text.
    pub async fn attach_evidence(&mut self, file_name: &str, content: Bytes) -> Result<usize> {
        let entry_id = self
            .active_quiz
            .as_ref()
            .ok_or(GurukulError::NoActiveQuiz)?
            .0;
        let mime = validate_evidence(&content, self.config.upload.max_file_bytes)?;
        self.begin_network()?;

        let file = SubmissionFile {
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            content: content.clone(),
        };

        let result = self.backend.upload_image(&file).await;
        self.busy = false;
        let response = result?;

        let evidence = EvidenceFile {
            file_id: response.file_id,
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            content,
            extracted_text: response.extracted_text,
            confidence: response.confidence,
        };

        let mut merged = 0;
        self.timeline.update_by_id(entry_id, |entry| {
            if let EntryBody::Quiz { quiz, .. } = &mut entry.body {
                let extracted = evidence.extracted_text.clone();
                quiz.attach_evidence(evidence);
                merged = merge_extracted_answers(quiz, &extracted);
            }
        });
        Ok(merged)
    }

    /// Detach the evidence file from the active quiz
    ///
    /// Answers already merged from its extracted text stay put.
    pub fn clear_evidence(&mut self) -> Result<()> {
        let entry_id = self
            .active_quiz
            .as_ref()
            .ok_or(GurukulError::NoActiveQuiz)?
            .0;
        self.timeline.update_by_id(entry_id, |entry| {
            if let EntryBody::Quiz { quiz, .. } = &mut entry.body {
                quiz.clear_evidence();
            }
        });
        Ok(())
    }

    /// Submit a quiz for evaluation
    ///
    /// With no explicit id the active quiz is submitted. The target is
    /// resolved by scanning the timeline for the matching quiz id, so any
    /// unevaluated quiz in the session can be submitted, and the returned
    /// report binds to that entry and no other. A submission with no answers
    /// and no evidence makes no request and reports `NothingToSubmit`.
    pub async fn submit_quiz(&mut self, quiz_id: Option<&str>) -> Result<SubmitOutcome> {
        let quiz_id = match quiz_id {
            Some(id) => id.to_string(),
            None => {
                let (_, id) = self
                    .active_quiz
                    .as_ref()
                    .ok_or(GurukulError::NoActiveQuiz)?;
                id.clone()
            }
        };

        let entry = self
            .timeline
            .find_quiz_entry(&quiz_id)
            .ok_or_else(|| GurukulError::QuizNotFound(quiz_id.clone()))?;
        let entry_id = entry.id;
        let quiz = match &entry.body {
            EntryBody::Quiz { quiz, .. } => quiz,
            _ => return Err(GurukulError::QuizNotFound(quiz_id).into()),
        };

        if quiz.evaluated {
            return Err(GurukulError::AlreadyEvaluated(quiz_id).into());
        }
        if !quiz.has_submittable_content() {
            return Ok(SubmitOutcome::NothingToSubmit);
        }

        let submission = quiz.build_submission();
        self.begin_network()?;
        let result = self.backend.evaluate_quiz(&submission).await;
        self.busy = false;
        let response = result?;

        let report = crate::session::quiz::EvaluationReport::from(response);
        self.timeline.update_by_id(entry_id, |entry| {
            if let EntryBody::Quiz { quiz, evaluation } = &mut entry.body {
                quiz.evaluated = true;
                *evaluation = Some(report.clone());
            }
        });

        // A submitted active quiz stops accepting answers.
        if matches!(&self.active_quiz, Some((_, id)) if *id == quiz_id) {
            self.active_quiz = None;
        }

        Ok(SubmitOutcome::Evaluated(entry_id))
    }
}

/// True for the fixed labels written into entries when a request fails
fn is_failure_label(content: &str) -> bool {
    content == CHAT_FAILURE_MESSAGE
        || content == SUMMARY_FAILURE_MESSAGE
        || content == QUIZ_FAILURE_MESSAGE
}

fn validate_quiz_counts(num_mcqs: u32, num_fill_blank: u32, num_short_answer: u32) -> Result<()> {
    if !(1..=20).contains(&num_mcqs) {
        return Err(GurukulError::Config(format!(
            "MCQ count must be between 1 and 20, got {}",
            num_mcqs
        ))
        .into());
    }
    if !(1..=10).contains(&num_fill_blank) {
        return Err(GurukulError::Config(format!(
            "Fill-in-the-blank count must be between 1 and 10, got {}",
            num_fill_blank
        ))
        .into());
    }
    if !(1..=10).contains(&num_short_answer) {
        return Err(GurukulError::Config(format!(
            "Short-answer count must be between 1 and 10, got {}",
            num_short_answer
        ))
        .into());
    }
    Ok(())
}

/// Check an evidence file locally, returning its MIME type
///
/// The backend rejects non-images and oversized files; failing early saves
/// the round trip and gives a clearer message.
fn validate_evidence(content: &Bytes, max_file_bytes: u64) -> Result<&'static str> {
    if content.len() as u64 > max_file_bytes {
        return Err(GurukulError::InvalidEvidence(format!(
            "file is {} bytes, limit is {}",
            content.len(),
            max_file_bytes
        ))
        .into());
    }
    let format = image::guess_format(content)
        .map_err(|_| GurukulError::InvalidEvidence("not a recognizable image".to_string()))?;
    Ok(format.to_mime_type())
}
