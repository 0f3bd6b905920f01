//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the client gets a safe message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::FlowError;
use crate::services::auth::AuthError;
use crate::services::vision::VisionError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Vision service call failed.
    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),

    /// Request not allowed in the current flow state.
    #[error("{0}")]
    Flow(#[from] FlowError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error is a server-side failure worth reporting.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Session(_) => true,
            Self::Vision(err) => !matches!(err, VisionError::InvalidImage(_)),
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Flow(_) | Self::BadRequest(_) => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Vision(err) => match err {
                VisionError::InvalidImage(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::FaceNotRecognised(_) => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists
                | AuthError::FaceAlreadyEnrolled
                | AuthError::PasswordStepCompleted
                | AuthError::AlreadyAuthenticated => StatusCode::CONFLICT,
                AuthError::MissingField(_)
                | AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::FaceEnrolmentFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Flow(err) => match err {
                FlowError::InvalidPayload { .. } | FlowError::EmptyMessage => {
                    StatusCode::BAD_REQUEST
                }
                FlowError::DocumentsAlreadyVerified
                | FlowError::DocumentInProgress
                | FlowError::NoNextStep
                | FlowError::NotAtDocumentsStep
                | FlowError::ChatBusy => StatusCode::CONFLICT,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    // Don't expose internal error details to clients
    fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Session(_) => "Internal server error".to_string(),
            Self::Vision(err) => match err {
                VisionError::InvalidImage(_) => "The image could not be read".to_string(),
                VisionError::Rejected(_) => {
                    "The image could not be processed. Please retake it.".to_string()
                }
                _ => "The verification service is unavailable right now".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::FaceNotRecognised(_) => {
                    "Face not recognised. Please retake the photo.".to_string()
                }
                AuthError::FaceEnrolmentFailed(_) => {
                    "No face could be enrolled from that photo. Please retake it.".to_string()
                }
                AuthError::FaceAlreadyEnrolled => {
                    "A face is already enrolled for this account".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::MissingField(field) => format!("Missing {field}"),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::PasswordStepCompleted => {
                    "Password already verified; continue with face verification".to_string()
                }
                AuthError::AlreadyAuthenticated => "Already signed in".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Flow(err) => err.to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.client_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Called once both login factors have passed.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a user action.
///
/// ```rust,ignore
/// add_breadcrumb("documents", "Document submitted", Some(&[("kind", "pan")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
