//! Wire types for the tutor backend API
//!
//! Request and response structures matching the backend's JSON schemas.
//! Field names follow the backend's snake_case wire format, so most structs
//! serialize without rename attributes.

use serde::{Deserialize, Serialize};

/// One curriculum topic as listed by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct Topic {
    pub topic_id: String,
    pub topic_name: String,
    pub class_level: String,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request for generating a topic summary
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest {
    pub topic_id: String,
    pub topic_name: String,
    pub class_level: String,
}

/// Response containing a topic summary
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    pub topic_id: String,
    pub topic_name: String,
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// Single message in a chat request
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

/// Request for a streamed chat turn
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub topic_id: String,
    pub topic_name: String,
    pub class_level: String,
    pub messages: Vec<ChatMessage>,
}

/// Citation attached to a completed chat answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "class")]
    pub class_level: Option<String>,
}

/// Request for quiz generation
#[derive(Debug, Clone, Serialize)]
pub struct QuizRequest {
    pub topic_id: String,
    pub topic_name: String,
    pub class_level: String,
    pub num_mcqs: u32,
    pub num_fill_blank: u32,
    pub num_short_answer: u32,
}

/// Question type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Mcq,
    FillBlank,
    ShortAnswer,
}

/// Single quiz question
#[derive(Debug, Clone, Deserialize)]
pub struct QuizQuestion {
    pub question_id: String,
    pub question_type: QuestionKind,
    pub question: String,
    /// Present only for multiple-choice questions
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Response containing a generated quiz
#[derive(Debug, Clone, Deserialize)]
pub struct QuizResponse {
    pub quiz_id: String,
    pub topic_id: String,
    pub topic_name: String,
    pub questions: Vec<QuizQuestion>,
    pub total_questions: u32,
}

/// Response after image upload and OCR
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUploadResponse {
    pub file_id: String,
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Per-question verdict in an evaluation response
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub needs_review: bool,
}

/// Response containing evaluation results
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationResponse {
    pub quiz_id: String,
    pub total_questions: u32,
    pub correct_count: u32,
    pub score_percentage: f64,
    #[serde(default)]
    pub question_results: Vec<QuestionResult>,
    #[serde(default)]
    pub topics_to_review: Vec<String>,
    #[serde(default)]
    pub feedback: String,
}

/// Error body the backend returns on non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_topic() {
        let json = r#"{
            "topic_id": "viii_friction",
            "topic_name": "Friction",
            "class_level": "Class VIII",
            "chapter": "Chapter 12"
        }"#;
        let topic: Topic = serde_json::from_str(json).unwrap();
        assert_eq!(topic.topic_id, "viii_friction");
        assert_eq!(topic.chapter.as_deref(), Some("Chapter 12"));
        assert!(topic.description.is_none());
    }

    #[test]
    fn test_deserialize_question_kinds() {
        for (wire, kind) in [
            ("mcq", QuestionKind::Mcq),
            ("fill_blank", QuestionKind::FillBlank),
            ("short_answer", QuestionKind::ShortAnswer),
        ] {
            let json = format!(
                r#"{{
                    "question_id": "q1",
                    "question_type": "{}",
                    "question": "What is friction?",
                    "correct_answer": "A force"
                }}"#,
                wire
            );
            let question: QuizQuestion = serde_json::from_str(&json).unwrap();
            assert_eq!(question.question_type, kind);
            assert!(question.options.is_none());
        }
    }

    #[test]
    fn test_deserialize_quiz_response() {
        let json = r#"{
            "quiz_id": "quiz-1",
            "topic_id": "viii_friction",
            "topic_name": "Friction",
            "total_questions": 1,
            "questions": [{
                "question_id": "q1",
                "question_type": "mcq",
                "question": "Friction always acts ...?",
                "options": ["with motion", "against motion"],
                "correct_answer": "against motion",
                "explanation": "Friction opposes relative motion."
            }]
        }"#;
        let quiz: QuizResponse = serde_json::from_str(json).unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].options.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_deserialize_evaluation_response() {
        let json = r#"{
            "quiz_id": "quiz-1",
            "total_questions": 3,
            "correct_count": 2,
            "score_percentage": 66.67,
            "question_results": [
                {"question_id": "q1", "is_correct": true, "feedback": "Good", "needs_review": false},
                {"question_id": "q2", "is_correct": true, "feedback": "", "needs_review": false},
                {"question_id": "q3", "is_correct": false, "feedback": "Revise", "needs_review": true}
            ],
            "topics_to_review": ["Irrigation"],
            "feedback": "Well done overall"
        }"#;
        let eval: EvaluationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(eval.correct_count, 2);
        assert_eq!(eval.question_results.len(), 3);
        assert!(eval.question_results[2].needs_review);
    }

    #[test]
    fn test_source_ref_class_rename() {
        let json = r#"{"page_number": 12, "source": "textbook.pdf", "class": "Class VIII"}"#;
        let source: SourceRef = serde_json::from_str(json).unwrap();
        assert_eq!(source.class_level.as_deref(), Some("Class VIII"));
    }

    #[test]
    fn test_serialize_chat_request() {
        let request = ChatRequest {
            topic_id: "viii_friction".to_string(),
            topic_name: "Friction".to_string(),
            class_level: "Class VIII".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Why do we slip on ice?".to_string(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["num_mcqs"], serde_json::Value::Null);
    }

    #[test]
    fn test_deserialize_error_detail() {
        let json = r#"{"detail": "Quiz quiz-9 not found"}"#;
        let detail: ErrorDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.detail, "Quiz quiz-9 not found");
    }
}
