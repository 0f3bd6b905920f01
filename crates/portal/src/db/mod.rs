//! Credential store for the portal.
//!
//! # Database: `branchline`
//!
//! ## Tables
//!
//! - `users` - Registered users, their Argon2id password hashes, and whether
//!   a face is enrolled
//! - `tower_sessions.session` - Session storage (created by `bl-cli migrate`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/portal/migrations/` and run via:
//! ```bash
//! cargo run -p branchline-cli -- migrate
//! ```
//!
//! Handlers reach the store through the [`UserStore`] trait so the router can
//! run against [`MemoryUserStore`] without a database.

pub mod memory;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use branchline_core::{Email, UserId};

use crate::models::user::User;

pub use memory::MemoryUserStore;
pub use users::PgUserStore;

/// Errors from credential store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Keyed access to registered users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by normalised email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Look up a user together with their password hash.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Insert a new user.
    ///
    /// Returns [`RepositoryError::Conflict`] when the email is taken.
    async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Mark the user's face as enrolled.
    ///
    /// Returns `false` without changing anything when a face is already
    /// enrolled.
    async fn claim_face_enrolment(&self, id: UserId) -> Result<bool, RepositoryError>;

    /// Undo [`claim_face_enrolment`](Self::claim_face_enrolment) after the
    /// face service refused the capture.
    async fn release_face_enrolment(&self, id: UserId) -> Result<(), RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
