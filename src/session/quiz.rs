//! Quiz state and lifecycle rules
//!
//! A quiz lives inside the timeline entry that announced it. This module
//! holds the session-side quiz types (converted from the wire DTOs), the
//! answer map semantics, evidence handling, and the local submission
//! preconditions. The orchestrator wires these rules to the network.

use crate::backend::{
    self, EvaluationResponse, QuestionKind, QuizResponse, SubmissionFile,
};
use bytes::Bytes;
use std::collections::BTreeMap;

/// One quiz question as held by the session
#[derive(Debug, Clone)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    /// Present only for multiple-choice questions
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

impl From<backend::QuizQuestion> for Question {
    fn from(q: backend::QuizQuestion) -> Self {
        Self {
            id: q.question_id,
            kind: q.question_type,
            prompt: q.question,
            options: q.options.unwrap_or_default(),
            correct_answer: q.correct_answer,
            explanation: q.explanation,
        }
    }
}

/// An uploaded answer-sheet image bound to a quiz
///
/// The raw bytes are kept so submission can forward the same image the OCR
/// pass saw.
#[derive(Debug, Clone)]
pub struct EvidenceFile {
    pub file_id: String,
    pub file_name: String,
    pub mime: String,
    pub content: Bytes,
    pub extracted_text: String,
    pub confidence: Option<f64>,
}

impl EvidenceFile {
    /// The file content in the form the backend trait expects
    pub fn as_submission_file(&self) -> SubmissionFile {
        SubmissionFile {
            file_name: self.file_name.clone(),
            mime: self.mime.clone(),
            content: self.content.clone(),
        }
    }
}

/// Per-question verdict of an evaluation
#[derive(Debug, Clone)]
pub struct QuestionVerdict {
    pub question_id: String,
    pub is_correct: bool,
    pub feedback: String,
    pub needs_review: bool,
}

/// An evaluation bound to one quiz
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub quiz_id: String,
    pub total_questions: u32,
    pub correct_count: u32,
    pub score_percentage: f64,
    pub question_results: Vec<QuestionVerdict>,
    pub topics_to_review: Vec<String>,
    pub feedback: String,
}

impl EvaluationReport {
    /// The score formatted for display, e.g. `66.7%`
    pub fn display_score(&self) -> String {
        format!("{:.1}%", self.score_percentage)
    }
}

impl From<EvaluationResponse> for EvaluationReport {
    fn from(r: EvaluationResponse) -> Self {
        Self {
            quiz_id: r.quiz_id,
            total_questions: r.total_questions,
            correct_count: r.correct_count,
            score_percentage: r.score_percentage,
            question_results: r
                .question_results
                .into_iter()
                .map(|q| QuestionVerdict {
                    question_id: q.question_id,
                    is_correct: q.is_correct,
                    feedback: q.feedback,
                    needs_review: q.needs_review,
                })
                .collect(),
            topics_to_review: r.topics_to_review,
            feedback: r.feedback,
        }
    }
}

/// One generated quiz and everything the student has done with it
///
/// Question order is significant: the answer reconciler maps OCR lines to
/// questions by position. Once `evaluated` is set the state is historical
/// record; further edits require generating a new quiz.
#[derive(Debug, Clone)]
pub struct QuizState {
    pub quiz_id: String,
    pub topic_name: String,
    pub questions: Vec<Question>,
    /// questionId -> answer text; last write wins
    pub answers: BTreeMap<String, String>,
    pub evidence: Option<EvidenceFile>,
    pub evaluated: bool,
}

impl QuizState {
    /// A fresh quiz with no answers, evidence, or evaluation
    pub fn new(
        quiz_id: impl Into<String>,
        topic_name: impl Into<String>,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            quiz_id: quiz_id.into(),
            topic_name: topic_name.into(),
            questions,
            answers: BTreeMap::new(),
            evidence: None,
            evaluated: false,
        }
    }

    /// Build session quiz state from a generation response
    pub fn from_response(response: QuizResponse) -> Self {
        let questions = response.questions.into_iter().map(Question::from).collect();
        Self::new(response.quiz_id, response.topic_name, questions)
    }

    /// Upsert one answer; the last write for a question id wins
    ///
    /// Answer content is not validated; grading is the evaluator's job.
    pub fn set_answer(&mut self, question_id: impl Into<String>, text: impl Into<String>) {
        self.answers.insert(question_id.into(), text.into());
    }

    /// True when the given question has a non-empty answer
    pub fn has_answer(&self, question_id: &str) -> bool {
        self.answers
            .get(question_id)
            .map(|a| !a.is_empty())
            .unwrap_or(false)
    }

    /// Attach an evidence file, replacing any previous one
    pub fn attach_evidence(&mut self, evidence: EvidenceFile) {
        self.evidence = Some(evidence);
    }

    /// Drop the evidence file; already-merged answers stay put
    pub fn clear_evidence(&mut self) {
        self.evidence = None;
    }

    /// Local submission precondition: something to grade must exist
    ///
    /// At least one manual (or merged) answer, or an attached evidence
    /// file. An empty submission is rejected before any network call.
    pub fn has_submittable_content(&self) -> bool {
        !self.answers.is_empty() || self.evidence.is_some()
    }

    /// Build the submission payload for the evaluator
    pub fn build_submission(&self) -> backend::QuizSubmission {
        backend::QuizSubmission {
            quiz_id: self.quiz_id.clone(),
            answers: self.answers.clone(),
            evidence: self.evidence.as_ref().map(|e| e.as_submission_file()),
        }
    }
}
