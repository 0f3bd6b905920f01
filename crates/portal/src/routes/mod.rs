//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                              - Redirect to login
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Readiness (credential store)
//!
//! # Auth (rate limited in production)
//! GET    /auth/login                    - Current login step
//! POST   /auth/login                    - Password step
//! POST   /auth/face                     - Face step
//! POST   /auth/register                 - Create account
//! POST   /auth/register/face            - Enrol face
//! POST   /auth/logout                   - Logout
//!
//! # Dashboard (requires both factors)
//! GET    /dashboard                     - Overview
//! GET    /dashboard/documents           - Cross-check state
//! POST   /dashboard/documents           - Submit Aadhaar or PAN
//! DELETE /dashboard/documents           - Reset the pair
//! GET    /dashboard/loan                - Wizard state
//! POST   /dashboard/loan/next           - Advance
//! POST   /dashboard/loan/back           - Go back
//! POST   /dashboard/loan/documents/:slot - Simulated upload
//! POST   /dashboard/loan/submit         - Generate application form
//! POST   /dashboard/loan/reset          - Start over
//! GET    /dashboard/chat                - Transcript
//! POST   /dashboard/chat/text           - Typed question
//! POST   /dashboard/chat/audio          - Voice question (multipart)
//! POST   /dashboard/chat/document       - Show a document
//! ```

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod documents;
pub mod health;
pub mod loan;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::middleware::LOGIN_PATH;
use crate::middleware::rate_limit::RateLimiterLayer;
use crate::state::AppState;

/// Largest accepted request body. Camera stills and recordings exceed the
/// axum default.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_status).post(auth::login))
        .route("/face", post(auth::face))
        .route("/register", post(auth::register))
        .route("/register/face", post(auth::register_face))
        .route("/logout", post(auth::logout))
}

/// Create the loan wizard routes router.
pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(loan::show))
        .route("/next", post(loan::next))
        .route("/back", post(loan::back))
        .route("/documents/{slot}", post(loan::upload))
        .route("/submit", post(loan::submit))
        .route("/reset", post(loan::reset))
}

/// Create the chat routes router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(chat::show))
        .route("/text", post(chat::send_text))
        .route("/audio", post(chat::send_audio))
        .route("/document", post(chat::send_document))
}

/// Create the dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route(
            "/documents",
            get(documents::show)
                .post(documents::submit)
                .delete(documents::reset),
        )
        .nest("/loan", loan_routes())
        .nest("/chat", chat_routes())
}

async fn home() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

fn assemble(auth: Router<AppState>) -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth)
        .nest("/dashboard", dashboard_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// Create all routes for the portal, without rate limiting.
pub fn routes() -> Router<AppState> {
    assemble(auth_routes())
}

/// Create all routes with the auth routes behind `limiter`.
pub fn rate_limited_routes(limiter: RateLimiterLayer) -> Router<AppState> {
    assemble(auth_routes().layer(limiter))
}
