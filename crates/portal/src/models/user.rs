//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use branchline_core::{Email, UserId};

/// A portal user (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Name as given at registration. Identity documents are checked against it.
    pub name: String,
    /// Normalised email address, the login key.
    pub email: Email,
    /// When the face used for the second login factor was enrolled.
    pub face_enrolled_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
