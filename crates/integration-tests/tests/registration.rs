//! Account registration and face enrolment.

use axum::http::StatusCode;
use branchline_integration_tests::{IMAGE, PASSWORD, TestApp};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn registration() -> serde_json::Value {
    json!({
        "name": "Asha   Rao",
        "email": "Asha@Example.in",
        "password": "correct horse battery"
    })
}

#[tokio::test]
async fn test_register_moves_to_face_step() {
    let mut app = TestApp::spawn().await;
    let response = app.post_json("/auth/register", &registration()).await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["step"], "face");
    assert_eq!(body["user"]["name"], "Asha Rao");
    assert_eq!(body["user"]["email"], "asha@example.in");

    assert_eq!(app.get("/auth/login").await.json()["step"], "face");
    assert_eq!(app.get("/dashboard").await.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let mut app = TestApp::spawn().await;
    app.seed_user("Asha Rao", "asha@example.in").await;

    let response = app.post_json("/auth/register", &registration()).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_fields_and_weak_password() {
    let mut app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/auth/register",
            &json!({"email": "asha@example.in", "password": "correct horse battery"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/auth/register",
            &json!({"name": "Asha Rao", "email": "asha@example.in", "password": "short"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.users.is_empty().await);
}

#[tokio::test]
async fn test_face_enrolment_keys_on_user_id() {
    let mut app = TestApp::spawn().await;
    let body = app.post_json("/auth/register", &registration()).await.json();
    let user_id = body["user"]["id"].to_string();

    Mock::given(method("POST"))
        .and(path("/register/face"))
        .and(body_partial_json(json!({"name": user_id})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"message": "Face registered successfully"},
            "error": null
        })))
        .expect(1)
        .mount(&app.vision)
        .await;

    let response = app
        .post_json("/auth/register/face", &json!({"image": IMAGE}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    // Enrolment alone does not sign the user in.
    assert_eq!(response.json(), json!({"step": "face"}));

    app.mock_face_match().await;
    let response = app.post_json("/auth/face", &json!({"image": IMAGE})).await;
    assert_eq!(response.json()["step"], "authenticated");
}

#[tokio::test]
async fn test_enrolment_without_face_in_capture() {
    let mut app = TestApp::spawn().await;
    app.post_json("/auth/register", &registration()).await;

    Mock::given(method("POST"))
        .and(path("/register/face"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": null, "error": "No face detected"})),
        )
        .up_to_n_times(1)
        .mount(&app.vision)
        .await;

    let response = app
        .post_json("/auth/register/face", &json!({"image": IMAGE}))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.get("/auth/login").await.json()["step"], "face");

    // A refused capture does not use up the enrolment.
    app.mock_face_enrolment().await;
    let response = app
        .post_json("/auth/register/face", &json!({"image": IMAGE}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_face_is_enrolled_only_once() {
    let mut app = TestApp::spawn().await;
    app.post_json("/auth/register", &registration()).await;
    app.mock_face_enrolment().await;

    let first = app
        .post_json("/auth/register/face", &json!({"image": IMAGE}))
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .post_json("/auth/register/face", &json!({"image": IMAGE}))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.text(), "A face is already enrolled for this account");
}

#[tokio::test]
async fn test_password_login_cannot_replace_enrolled_face() {
    let mut app = TestApp::spawn().await;
    app.seed_user("Asha Rao", "asha@example.in").await;
    Mock::given(method("POST"))
        .and(path("/register/face"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.vision)
        .await;

    let response = app
        .post_json(
            "/auth/login",
            &json!({"email": "asha@example.in", "password": PASSWORD}),
        )
        .await;
    assert_eq!(response.json()["step"], "face");

    let response = app
        .post_json("/auth/register/face", &json!({"image": IMAGE}))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    // The session still has to pass the face step against the enrolled face.
    assert_eq!(app.get("/auth/login").await.json()["step"], "face");
    assert_eq!(app.get("/dashboard").await.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_signed_in_session_cannot_enrol() {
    let mut app = TestApp::signed_in("Asha Rao", "asha@example.in").await;
    Mock::given(method("POST"))
        .and(path("/register/face"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.vision)
        .await;

    let response = app
        .post_json("/auth/register/face", &json!({"image": IMAGE}))
        .await;
    assert_eq!(response.location(), Some("/auth/login"));
    assert_eq!(app.get("/auth/login").await.json()["step"], "authenticated");
}

#[tokio::test]
async fn test_enrolment_requires_password_step() {
    let mut app = TestApp::spawn().await;
    let response = app
        .post_json("/auth/register/face", &json!({"image": IMAGE}))
        .await;
    assert_eq!(response.location(), Some("/auth/login"));
}
