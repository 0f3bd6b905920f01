//! Branch manager chat through the dashboard.

use axum::http::StatusCode;
use branchline_integration_tests::{IMAGE, TestApp};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const GREETING: &str = "Hello! I'm your virtual branch manager. How can I assist you today?";

async fn signed_in() -> TestApp {
    TestApp::signed_in("Asha Rao", "asha@example.in").await
}

#[tokio::test]
async fn test_transcript_starts_with_greeting() {
    let mut app = signed_in().await;
    let body = app.get("/dashboard/chat").await.json();

    assert_eq!(body["processing"], false);
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["messages"][0]["role"], "assistant");
    assert_eq!(body["messages"][0]["content"], GREETING);
}

#[tokio::test]
async fn test_blank_message_is_refused_without_calling_out() {
    let mut app = signed_in().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "hi"})))
        .expect(0)
        .mount(&app.assistant)
        .await;

    for text in ["", "   ", "\n\t"] {
        let response = app
            .post_json("/dashboard/chat/text", &json!({"text": text}))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    let body = app.get("/dashboard/chat").await.json();
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_text_question_gets_one_reply() {
    let mut app = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/query/text"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "Home loans start at 8.4%."})),
        )
        .expect(1)
        .mount(&app.assistant)
        .await;

    let response = app
        .post_json("/dashboard/chat/text", &json!({"text": "Home loan rates?"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "Home loan rates?");
    assert_eq!(messages[2]["content"], "Home loans start at 8.4%.");
    assert_eq!(body["processing"], false);
}

#[tokio::test]
async fn test_assistant_outage_appends_fallback() {
    let mut app = signed_in().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&app.assistant)
        .await;

    let body = app
        .post_json("/dashboard/chat/text", &json!({"text": "hello"}))
        .await
        .json();
    assert_eq!(
        body["messages"][2]["content"],
        "Sorry, I couldn't process your request right now. Please try again."
    );
}

#[tokio::test]
async fn test_voice_question() {
    let mut app = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/query/audio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transcription": "What documents do I need?",
            "response": "Aadhaar and PAN.",
            "audio_url": "reply_1.mp3"
        })))
        .expect(1)
        .mount(&app.assistant)
        .await;

    let response = app
        .post_file("/dashboard/chat/audio", "audio", "question.webm", b"\x1a\x45\xdf\xa3")
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["messages"][1]["content"], "What documents do I need?");
    assert_eq!(body["messages"][2]["content"], "Aadhaar and PAN.");
    assert_eq!(
        body["messages"][2]["audio"],
        format!("{}/audio/reply_1.mp3", app.assistant.uri())
    );
}

#[tokio::test]
async fn test_voice_question_needs_audio_field() {
    let mut app = signed_in().await;
    let response = app
        .post_file("/dashboard/chat/audio", "recording", "question.webm", b"abc")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_document_shown_to_branch_manager() {
    let mut app = signed_in().await;
    app.mock_document(
        "aadhar",
        json!({"full_name": "Asha Rao", "aadhaar_number": "1234 5678 9012"}),
    )
    .await;

    let body = app
        .post_json(
            "/dashboard/chat/document",
            &json!({"document_type": "aadhaar", "image": IMAGE}),
        )
        .await
        .json();

    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[1]["attachment"]["fields"]["aadhaar_number"],
        "1234 5678 9012"
    );
}

#[tokio::test]
async fn test_logout_drops_transcript() {
    let mut app = signed_in().await;
    app.mock_face_match().await;
    Mock::given(method("POST"))
        .and(path("/query/text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
        .mount(&app.assistant)
        .await;
    app.post_json("/dashboard/chat/text", &json!({"text": "hello"}))
        .await;

    app.post("/auth/logout").await;
    app.post_json(
        "/auth/login",
        &json!({"email": "asha@example.in", "password": branchline_integration_tests::PASSWORD}),
    )
    .await;
    app.post_json("/auth/face", &json!({"image": IMAGE})).await;

    let body = app.get("/dashboard/chat").await.json();
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
}
