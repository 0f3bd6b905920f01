//! Authentication service.
//!
//! Password registration and the first login factor. The second factor (face
//! match) is delegated to [`VisionClient`](crate::services::vision::VisionClient).
//!
//! A face can be enrolled once per account; later enrolments are refused.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use branchline_core::{Email, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles user registration and password verification.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Register a new user with name, email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if the name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        if email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        let email = Email::parse(email)?;

        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&name, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is malformed or
    /// unknown, or the password is wrong.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Reserve the user's single face enrolment.
    ///
    /// Call before sending the capture to the face service, and
    /// [`abandon_face_enrolment`](Self::abandon_face_enrolment) if the
    /// service refuses it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::FaceAlreadyEnrolled` if a face is already enrolled.
    pub async fn begin_face_enrolment(&self, user: UserId) -> Result<(), AuthError> {
        if self.users.claim_face_enrolment(user).await? {
            Ok(())
        } else {
            tracing::warn!(user_id = %user, "refused to replace an enrolled face");
            Err(AuthError::FaceAlreadyEnrolled)
        }
    }

    /// Give back a reservation taken by
    /// [`begin_face_enrolment`](Self::begin_face_enrolment).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store is unreachable.
    pub async fn abandon_face_enrolment(&self, user: UserId) -> Result<(), AuthError> {
        self.users.release_face_enrolment(user).await?;
        Ok(())
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
