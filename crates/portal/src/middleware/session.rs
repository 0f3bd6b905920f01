//! Session layer and typed access to session-held flow state.
//!
//! The browser holds only the session id cookie. Everything else lives in
//! the store under the keys in [`session_keys`].

use secrecy::ExposeSecret as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::PortalConfig;
use crate::models::{DocumentState, LoanApplication, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bl_session";

/// Session expiry after inactivity, in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Wrap any session store in the portal's cookie settings.
#[must_use]
pub fn build_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &PortalConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Create the session layer backed by `PostgreSQL`.
///
/// The `tower_sessions.session` table is created by `bl-cli migrate`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &PortalConfig,
) -> SessionManagerLayer<PostgresStore> {
    tracing::debug!(
        secure = config.is_secure(),
        database = %redacted_host(config.database_url.expose_secret()),
        "creating session layer"
    );
    build_session_layer(PostgresStore::new(pool.clone()), config)
}

fn redacted_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| "unknown".to_string())
}

// =============================================================================
// Flow State
// =============================================================================

async fn load<T: DeserializeOwned + Default>(
    session: &Session,
    key: &str,
) -> Result<T, tower_sessions::session::Error> {
    Ok(session.get::<T>(key).await?.unwrap_or_default())
}

async fn store<T: Serialize>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(key, value).await
}

/// Load the document cross-check state, empty if none is stored.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_documents(
    session: &Session,
) -> Result<DocumentState, tower_sessions::session::Error> {
    load(session, session_keys::DOCUMENTS).await
}

/// Persist the document cross-check state.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn store_documents(
    session: &Session,
    documents: &DocumentState,
) -> Result<(), tower_sessions::session::Error> {
    store(session, session_keys::DOCUMENTS, documents).await
}

/// Load the loan application, blank if none is stored.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_loan(
    session: &Session,
) -> Result<LoanApplication, tower_sessions::session::Error> {
    load(session, session_keys::LOAN_APPLICATION).await
}

/// Persist the loan application.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn store_loan(
    session: &Session,
    application: &LoanApplication,
) -> Result<(), tower_sessions::session::Error> {
    store(session, session_keys::LOAN_APPLICATION, application).await
}
