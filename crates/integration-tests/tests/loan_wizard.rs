//! Loan application wizard through the dashboard.

use axum::http::StatusCode;
use branchline_integration_tests::TestApp;
use serde_json::{Value, json};

fn details() -> Value {
    json!({
        "amount": "500000",
        "tenure": 36,
        "income": "85000",
        "employment": "self_employed",
        "purpose": "Working capital"
    })
}

async fn at_documents_step() -> TestApp {
    let mut app = TestApp::signed_in("Asha Rao", "asha@example.in").await;

    let response = app
        .post_json("/dashboard/loan/next", &json!({"loan_type": "business"}))
        .await;
    assert_eq!(response.json()["progress"], 50);

    let response = app.post_json("/dashboard/loan/next", &details()).await;
    assert_eq!(response.json()["progress"], 100);
    app
}

#[tokio::test]
async fn test_blank_application_starts_at_type() {
    let mut app = TestApp::signed_in("Asha Rao", "asha@example.in").await;
    let body = app.get("/dashboard/loan").await.json();

    assert_eq!(body["application"]["step"], "type");
    assert_eq!(body["progress"], 25);
}

#[tokio::test]
async fn test_wrong_payload_shape_is_refused() {
    let mut app = TestApp::signed_in("Asha Rao", "asha@example.in").await;
    let response = app
        .post_json("/dashboard/loan/next", &json!({"amount": "500000"}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.get("/dashboard/loan").await.json()["progress"], 25);
}

#[tokio::test]
async fn test_back_and_next() {
    let mut app = at_documents_step().await;

    let body = app.post("/dashboard/loan/back").await.json();
    assert_eq!(body["application"]["step"], "details");
    assert_eq!(body["application"]["details"]["tenure"], 36);

    app.post("/dashboard/loan/back").await;
    let body = app.post("/dashboard/loan/back").await.json();
    assert_eq!(body["application"]["step"], "type");
}

#[tokio::test]
async fn test_uploads_are_acknowledged_at_documents_step() {
    let mut app = TestApp::signed_in("Asha Rao", "asha@example.in").await;
    let early = app.post("/dashboard/loan/documents/identity").await;
    assert_eq!(early.status, StatusCode::CONFLICT);

    let mut app = at_documents_step().await;
    let body = app.post("/dashboard/loan/documents/address").await.json();
    assert_eq!(body["application"]["documents"]["address"], true);
    assert_eq!(body["application"]["documents"]["income"], false);

    let unknown = app.post("/dashboard/loan/documents/selfie").await;
    assert!(unknown.status.is_client_error());
}

#[tokio::test]
async fn test_submit_generates_form_and_resets() {
    let mut app = at_documents_step().await;
    app.mock_document(
        "pan",
        json!({"full_name": "Asha Rao", "date_of_birth": "07/03/1990", "pan_number": "ABCDE1234F"}),
    )
    .await;
    app.post_json(
        "/dashboard/documents",
        &json!({"document_type": "pan", "image": branchline_integration_tests::IMAGE}),
    )
    .await;

    let response = app.post("/dashboard/loan/submit").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["redirect"], "/dashboard/chat?approved");
    assert_eq!(body["form"]["personal_details"]["pan_number"], "ABCDE1234F");
    assert_eq!(body["form"]["contact_details"]["email"], "asha@example.in");
    assert_eq!(body["form"]["loan_details"]["loan_type"], "business");
    // Only one of the two documents is on file.
    assert_eq!(body["form"]["eligibility_status"]["eligible"], false);
    assert_eq!(
        body["form"]["eligibility_status"]["missing_documents"],
        json!(["Aadhaar Card"])
    );

    assert_eq!(app.get("/dashboard/loan").await.json()["progress"], 25);
}

#[tokio::test]
async fn test_submit_before_documents_step_conflicts() {
    let mut app = TestApp::signed_in("Asha Rao", "asha@example.in").await;
    assert_eq!(
        app.post("/dashboard/loan/submit").await.status,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn test_reset() {
    let mut app = at_documents_step().await;
    let body = app.post("/dashboard/loan/reset").await.json();
    assert_eq!(body["application"]["step"], "type");
    assert!(body["application"]["details"].is_null());
}
