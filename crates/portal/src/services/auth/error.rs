//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during registration and the two-factor login flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] branchline_core::EmailError),

    /// A required registration field was empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The face capture did not match the registered face.
    #[error("face not recognised: {0}")]
    FaceNotRecognised(String),

    /// The face service could not enrol the capture.
    #[error("face enrolment failed: {0}")]
    FaceEnrolmentFailed(String),

    /// The account already has an enrolled face.
    #[error("face already enrolled")]
    FaceAlreadyEnrolled,

    /// A password was submitted after the password step had already passed.
    #[error("password step already completed")]
    PasswordStepCompleted,

    /// The session is already fully authenticated.
    #[error("already signed in")]
    AlreadyAuthenticated,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
