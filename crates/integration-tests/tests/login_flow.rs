//! Two-factor login: password, then face.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use branchline_integration_tests::{IMAGE, PASSWORD, TestApp};
use serde_json::json;

const EMAIL: &str = "asha@example.in";

async fn app_with_user() -> TestApp {
    let app = TestApp::spawn().await;
    app.seed_user("Asha Rao", EMAIL).await;
    app
}

#[tokio::test]
async fn test_fresh_session_starts_at_password() {
    let mut app = TestApp::spawn().await;
    let response = app.get("/auth/login").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"step": "password"}));
}

#[tokio::test]
async fn test_wrong_password_stays_at_password() {
    let mut app = app_with_user().await;
    let response = app
        .post_json("/auth/login", &json!({"email": EMAIL, "password": "nope nope nope"}))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.text(), "Invalid email or password");
    assert_eq!(app.get("/auth/login").await.json()["step"], "password");
}

#[tokio::test]
async fn test_unknown_email_is_indistinguishable() {
    let mut app = app_with_user().await;
    let response = app
        .post_json(
            "/auth/login",
            &json!({"email": "ravi@example.in", "password": PASSWORD}),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.text(), "Invalid email or password");
}

#[tokio::test]
async fn test_password_verified_resumes_at_face_and_refuses_password() {
    let mut app = app_with_user().await;
    let response = app
        .post_json("/auth/login", &json!({"email": EMAIL, "password": PASSWORD}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"step": "face"}));

    assert_eq!(app.get("/auth/login").await.json(), json!({"step": "face"}));

    let again = app
        .post_json("/auth/login", &json!({"email": EMAIL, "password": PASSWORD}))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(app.get("/auth/login").await.json()["step"], "face");

    // Not yet through the second factor.
    let dashboard = app.get("/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::SEE_OTHER);
    assert_eq!(dashboard.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_face_mismatch_asks_for_retake() {
    let mut app = app_with_user().await;
    app.mock_face_mismatch().await;
    app.post_json("/auth/login", &json!({"email": EMAIL, "password": PASSWORD}))
        .await;

    let response = app.post_json("/auth/face", &json!({"image": IMAGE})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.text().contains("retake"));
    assert_eq!(app.get("/auth/login").await.json()["step"], "face");
}

#[tokio::test]
async fn test_face_without_password_redirects_to_login() {
    let mut app = app_with_user().await;
    let response = app.post_json("/auth/face", &json!({"image": IMAGE})).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_malformed_capture_is_bad_request() {
    let mut app = app_with_user().await;
    app.post_json("/auth/login", &json!({"email": EMAIL, "password": PASSWORD}))
        .await;

    let response = app
        .post_json("/auth/face", &json!({"image": "not an image!"}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_login_reaches_dashboard() {
    let mut app = TestApp::signed_in("Asha Rao", EMAIL).await;

    let status = app.get("/auth/login").await.json();
    assert_eq!(
        status,
        json!({"step": "authenticated", "redirect": "/dashboard"})
    );

    let again = app
        .post_json("/auth/login", &json!({"email": EMAIL, "password": PASSWORD}))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let dashboard = app.get("/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    let body = dashboard.json();
    assert_eq!(body["user"]["email"], EMAIL);
    assert_eq!(body["loan"]["progress"], 25);
    assert_eq!(body["documents"]["verified"], false);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let mut app = TestApp::signed_in("Asha Rao", EMAIL).await;
    assert!(app.has_session());

    let response = app.post("/auth/logout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    assert!(!app.has_session());

    assert_eq!(app.get("/dashboard").await.location(), Some("/auth/login"));
    assert_eq!(app.get("/auth/login").await.json()["step"], "password");
}

#[tokio::test]
async fn test_logout_abandons_half_finished_login() {
    let mut app = app_with_user().await;
    app.post_json("/auth/login", &json!({"email": EMAIL, "password": PASSWORD}))
        .await;

    app.post("/auth/logout").await;
    assert_eq!(app.get("/auth/login").await.json()["step"], "password");
}
