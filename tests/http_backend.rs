//! HTTP backend tests against a wiremock server

use gurukul::backend::{
    ChatMessage, ChatRequest, HttpBackend, QuizRequest, SubmissionFile, SummaryRequest,
    TutorBackend,
};
use gurukul::config::BackendConfig;
use gurukul::error::GurukulError;

use futures::StreamExt;
use std::collections::BTreeMap;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    })
    .unwrap()
}

fn summary_request() -> SummaryRequest {
    SummaryRequest {
        topic_id: "viii_friction".to_string(),
        topic_name: "Friction".to_string(),
        class_level: "Class VIII".to_string(),
    }
}

#[tokio::test]
async fn test_list_classes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/topics/classes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!(["Class VIII", "Class IX"])),
        )
        .mount(&server)
        .await;

    let classes = backend_for(&server).list_classes().await.unwrap();
    assert_eq!(classes, vec!["Class VIII", "Class IX"]);
}

#[tokio::test]
async fn test_list_topics_passes_class_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/topics/"))
        .and(query_param("class_level", "Class VIII"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"topic_id": "viii_friction", "topic_name": "Friction", "class_level": "Class VIII"}
        ])))
        .mount(&server)
        .await;

    let topics = backend_for(&server)
        .list_topics(Some("Class VIII"))
        .await
        .unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].topic_id, "viii_friction");
}

#[tokio::test]
async fn test_error_detail_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summary/"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"detail": "Topic viii_friction not found"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .generate_summary(&summary_request())
        .await
        .unwrap_err();

    match err.downcast_ref::<GurukulError>() {
        Some(GurukulError::Backend(detail)) => {
            assert_eq!(detail, "Topic viii_friction not found")
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_error_body_gets_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summary/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .generate_summary(&summary_request())
        .await
        .unwrap_err();

    match err.downcast_ref::<GurukulError>() {
        Some(GurukulError::Backend(detail)) => {
            assert!(detail.contains("500"), "message was: {}", detail)
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_failure_reported_as_transport() {
    // Nothing is listening on this port.
    let backend = HttpBackend::new(&BackendConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_seconds: 1,
    })
    .unwrap();

    let err = backend.list_classes().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GurukulError>(),
        Some(GurukulError::Transport(_))
    ));
}

#[tokio::test]
async fn test_chat_stream_frames_delivered_in_order() {
    let server = MockServer::start().await;
    let sse_body = concat!(
        "data: {\"chunk\": \"Fri\"}\n\n",
        "data: {\"chunk\": \"ction\"}\n\n",
        "data: {\"done\": true, \"full_response\": \"Friction.\", \"sources\": []}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body.as_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let request = ChatRequest {
        topic_id: "viii_friction".to_string(),
        topic_name: "Friction".to_string(),
        class_level: "Class VIII".to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: "What is friction?".to_string(),
        }],
    };

    let mut stream = backend_for(&server).chat_stream(&request).await.unwrap();
    let mut frames = Vec::new();
    while let Some(frame) = stream.next().await {
        frames.push(frame);
    }

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0], r#"{"chunk": "Fri"}"#);
    assert!(frames[2].contains("full_response"));
}

#[tokio::test]
async fn test_quiz_request_carries_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/quiz/"))
        .and(body_string_contains("\"num_mcqs\":4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "quiz_id": "quiz-1",
            "topic_id": "viii_friction",
            "topic_name": "Friction",
            "total_questions": 1,
            "questions": [{
                "question_id": "q1",
                "question_type": "mcq",
                "question": "Friction acts ...?",
                "options": ["with motion", "against motion"],
                "correct_answer": "against motion"
            }]
        })))
        .mount(&server)
        .await;

    let request = QuizRequest {
        topic_id: "viii_friction".to_string(),
        topic_name: "Friction".to_string(),
        class_level: "Class VIII".to_string(),
        num_mcqs: 4,
        num_fill_blank: 2,
        num_short_answer: 1,
    };

    let quiz = backend_for(&server).generate_quiz(&request).await.unwrap();
    assert_eq!(quiz.quiz_id, "quiz-1");
    assert_eq!(quiz.questions.len(), 1);
}

#[tokio::test]
async fn test_upload_image_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation/upload-image"))
        .and(body_string_contains("sheet.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "file_id": "file-3",
            "extracted_text": "Ploughing\nweeding",
            "confidence": 0.9
        })))
        .mount(&server)
        .await;

    let file = SubmissionFile {
        file_name: "sheet.png".to_string(),
        mime: "image/png".to_string(),
        content: bytes::Bytes::from_static(b"fake image bytes"),
    };

    let response = backend_for(&server).upload_image(&file).await.unwrap();
    assert_eq!(response.file_id, "file-3");
    assert_eq!(response.extracted_text, "Ploughing\nweeding");
}

#[tokio::test]
async fn test_evaluate_quiz_sends_answers_as_json_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluation/evaluate"))
        .and(body_string_contains("quiz-1"))
        .and(body_string_contains("\"q1\":\"Ploughing\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "quiz_id": "quiz-1",
            "total_questions": 1,
            "correct_count": 1,
            "score_percentage": 100.0,
            "question_results": [
                {"question_id": "q1", "is_correct": true, "feedback": "Correct", "needs_review": false}
            ],
            "topics_to_review": [],
            "feedback": "Well done"
        })))
        .mount(&server)
        .await;

    let mut answers = BTreeMap::new();
    answers.insert("q1".to_string(), "Ploughing".to_string());
    let submission = gurukul::backend::QuizSubmission {
        quiz_id: "quiz-1".to_string(),
        answers,
        evidence: None,
    };

    let report = backend_for(&server)
        .evaluate_quiz(&submission)
        .await
        .unwrap();
    assert_eq!(report.correct_count, 1);
    assert_eq!(report.question_results[0].feedback, "Correct");
}
