//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use branchline_core::{Email, UserId};

use super::user::User;

/// Session-stored user identity.
///
/// Minimal data kept in the session to identify the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User's database ID.
    pub id: UserId,
    /// Registered name.
    pub name: String,
    /// User's email address.
    pub email: Email,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Authentication state of a browser session.
///
/// The only way into [`AuthState::FullyAuthenticated`] is a successful face
/// match while in [`AuthState::PasswordVerified`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    /// No credentials presented.
    #[default]
    Anonymous,
    /// Password accepted, face not yet verified.
    PasswordVerified {
        /// The user who passed the password step.
        user: SessionUser,
    },
    /// Both factors passed.
    FullyAuthenticated {
        /// The signed-in user.
        user: SessionUser,
    },
}

/// Position in the login flow derived from an [`AuthState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStep {
    Password,
    Face,
    Authenticated,
}

impl AuthState {
    /// The login step a session in this state resumes at.
    #[must_use]
    pub const fn step(&self) -> LoginStep {
        match self {
            Self::Anonymous => LoginStep::Password,
            Self::PasswordVerified { .. } => LoginStep::Face,
            Self::FullyAuthenticated { .. } => LoginStep::Authenticated,
        }
    }

    /// The user attached to the session, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::Anonymous => None,
            Self::PasswordVerified { user } | Self::FullyAuthenticated { user } => Some(user),
        }
    }

    /// True only when both factors have passed.
    #[must_use]
    pub const fn is_fully_authenticated(&self) -> bool {
        matches!(self, Self::FullyAuthenticated { .. })
    }
}

/// Session keys.
pub mod keys {
    /// Key for the [`AuthState`](super::AuthState) union.
    pub const AUTH_STATE: &str = "auth_state";

    /// Key for the document cross-check state.
    pub const DOCUMENTS: &str = "documents";

    /// Key for the loan application in progress.
    pub const LOAN_APPLICATION: &str = "loan_application";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: UserId::new(3),
            name: "Asha Rao".to_string(),
            email: Email::parse("asha@example.in").unwrap(),
        }
    }

    #[test]
    fn test_steps_follow_state() {
        assert_eq!(AuthState::Anonymous.step(), LoginStep::Password);
        assert_eq!(
            AuthState::PasswordVerified { user: user() }.step(),
            LoginStep::Face
        );
        assert_eq!(
            AuthState::FullyAuthenticated { user: user() }.step(),
            LoginStep::Authenticated
        );
    }

    #[test]
    fn test_only_full_state_is_authenticated() {
        assert!(!AuthState::Anonymous.is_fully_authenticated());
        assert!(!AuthState::PasswordVerified { user: user() }.is_fully_authenticated());
        assert!(AuthState::FullyAuthenticated { user: user() }.is_fully_authenticated());
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let json = serde_json::to_value(AuthState::PasswordVerified { user: user() }).unwrap();
        assert_eq!(json["state"], "password_verified");
        assert_eq!(json["user"]["email"], "asha@example.in");

        let back: AuthState = serde_json::from_value(json).unwrap();
        assert_eq!(back.user().map(|u| u.id), Some(UserId::new(3)));
    }
}
