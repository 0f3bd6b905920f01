//! Test harness for the portal router.
//!
//! [`TestApp`] drives the real router in-process with `tower::ServiceExt::oneshot`,
//! an in-memory session store, the in-memory user store, and `wiremock`
//! servers standing in for the vision and assistant services. It keeps the
//! `bl_session` cookie between requests the way a browser would.
//!
//! ```bash
//! cargo test -p branchline-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
    middleware::from_fn,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use branchline_portal::config::{PortalConfig, VisionConfig, parse_service_url};
use branchline_portal::db::MemoryUserStore;
use branchline_portal::middleware::{
    SESSION_COOKIE_NAME, build_session_layer, security_headers_middleware,
};
use branchline_portal::models::User;
use branchline_portal::routes;
use branchline_portal::services::auth::AuthService;
use branchline_portal::state::AppState;

/// Password used for every seeded user.
pub const PASSWORD: &str = "correct horse battery";

/// A tiny valid base64 payload standing in for a camera still.
pub const IMAGE: &str = "aGVsbG8=";

/// Response captured from the router.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// Body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `Location` header of a redirect.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// The portal router wired to mock services.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    pub users: Arc<MemoryUserStore>,
    pub vision: MockServer,
    pub assistant: MockServer,
}

impl TestApp {
    /// Build a fresh app with empty stores.
    pub async fn spawn() -> Self {
        let vision = MockServer::start().await;
        let assistant = MockServer::start().await;
        let config = test_config(&vision, &assistant);

        let users = Arc::new(MemoryUserStore::new());
        let session_layer = build_session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config, users.clone()).unwrap();

        let router = routes::routes()
            .layer(from_fn(security_headers_middleware))
            .layer(session_layer)
            .with_state(state);

        Self {
            router,
            cookie: None,
            users,
            vision,
            assistant,
        }
    }

    /// Whether the browser currently holds a session cookie.
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    // =========================================================================
    // Requests
    // =========================================================================

    pub async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let request = self.with_cookie(request);
        let response = self.router.clone().oneshot(request).await.unwrap();
        self.capture(response).await
    }

    /// Send two JSON posts at once from the same browser.
    pub async fn post_json_pair(
        &mut self,
        uri: &str,
        first: &Value,
        second: &Value,
    ) -> (TestResponse, TestResponse) {
        let build = |body: &Value| {
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };
        let first = self.with_cookie(build(first));
        let second = self.with_cookie(build(second));

        let (first, second) = tokio::join!(
            self.router.clone().oneshot(first),
            self.router.clone().oneshot(second)
        );
        let first = self.capture(first.unwrap()).await;
        let second = self.capture(second.unwrap()).await;
        (first, second)
    }

    fn with_cookie(&self, mut request: Request<Body>) -> Request<Body> {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        request
    }

    async fn capture(&mut self, response: axum::response::Response) -> TestResponse {
        self.track_cookie(response.headers());

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post(&mut self, uri: &str) -> TestResponse {
        self.send(Request::post(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Post a single file field as `multipart/form-data`.
    pub async fn post_file(
        &mut self,
        uri: &str,
        field: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> TestResponse {
        const BOUNDARY: &str = "branchline-test-boundary";
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{file_name}\"\r\nContent-Type: audio/webm\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.send(
            Request::post(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    fn track_cookie(&mut self, headers: &HeaderMap) {
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let Some(rest) = value.strip_prefix(&prefix) else {
                continue;
            };
            let id = rest.split(';').next().unwrap_or_default();
            let removed = id.is_empty() || value.to_ascii_lowercase().contains("max-age=0");
            self.cookie = (!removed).then(|| format!("{prefix}{id}"));
        }
    }

    // =========================================================================
    // Scenario Helpers
    // =========================================================================

    /// Insert a returning user whose face is already enrolled.
    pub async fn seed_user(&self, name: &str, email: &str) -> User {
        let auth = AuthService::new(self.users.as_ref());
        let user = auth.register(name, email, PASSWORD).await.unwrap();
        auth.begin_face_enrolment(user.id).await.unwrap();
        user
    }

    /// Make every face enrolment succeed.
    pub async fn mock_face_enrolment(&self) {
        Mock::given(method("POST"))
            .and(path("/register/face"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"message": "Face registered successfully"},
                "error": null
            })))
            .mount(&self.vision)
            .await;
    }

    /// Make every face comparison succeed.
    pub async fn mock_face_match(&self) {
        Mock::given(method("POST"))
            .and(path("/recognise/face"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"message": "Face recognized successfully"},
                "error": null
            })))
            .mount(&self.vision)
            .await;
    }

    /// Make every face comparison fail.
    pub async fn mock_face_mismatch(&self) {
        Mock::given(method("POST"))
            .and(path("/recognise/face"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": null, "error": "No match found"})),
            )
            .mount(&self.vision)
            .await;
    }

    /// Answer extraction of `service_name` documents with `fields`.
    pub async fn mock_document(&self, service_name: &str, fields: Value) {
        Mock::given(method("POST"))
            .and(path("/extract/document"))
            .and(body_partial_json(json!({"name": service_name})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": fields, "error": null})),
            )
            .mount(&self.vision)
            .await;
    }

    /// Seed a user and complete both login factors.
    pub async fn signed_in(name: &str, email: &str) -> Self {
        let mut app = Self::spawn().await;
        app.seed_user(name, email).await;
        app.mock_face_match().await;

        let response = app
            .post_json(
                "/auth/login",
                &json!({"email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());

        let response = app.post_json("/auth/face", &json!({"image": IMAGE})).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        app
    }
}

fn test_config(vision: &MockServer, assistant: &MockServer) -> PortalConfig {
    PortalConfig {
        database_url: SecretString::from("postgres://unused@localhost/branchline"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        vision: VisionConfig {
            url: parse_service_url(&vision.uri()).unwrap(),
            token: None,
        },
        assistant_url: parse_service_url(&assistant.uri()).unwrap(),
        service_timeout: Duration::from_secs(5),
        loan_upload_ack: Duration::from_millis(10),
        chat_idle: Duration::from_secs(600),
        sentry_dsn: None,
        sentry_environment: None,
    }
}
