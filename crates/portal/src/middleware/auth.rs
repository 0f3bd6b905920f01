//! Authentication extractors.
//!
//! The two-factor invariant is enforced here: protected handlers take
//! [`RequireFullAuth`], face enrolment takes [`RequirePasswordStep`], and
//! neither can be constructed from any other session state.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{AuthState, SessionUser, session_keys};

/// Where unauthenticated browsers are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires both login factors.
///
/// ```rust,ignore
/// async fn dashboard(RequireFullAuth(user): RequireFullAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireFullAuth(pub SessionUser);

/// Extractor that requires a session which passed the password step only.
pub struct RequirePasswordStep(pub SessionUser);

/// The session's authentication state, whatever it is.
pub struct CurrentAuth(pub AuthState);

/// Error returned when a handler's authentication requirement is not met.
pub enum AuthRejection {
    /// Redirect to the login page.
    RedirectToLogin,
    /// No session layer in front of the handler.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn auth_state(parts: &Parts) -> Result<AuthState, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::MissingSession)?;

    // An unreadable state counts as signed out.
    Ok(session
        .get::<AuthState>(session_keys::AUTH_STATE)
        .await
        .ok()
        .flatten()
        .unwrap_or_default())
}

impl<S> FromRequestParts<S> for RequireFullAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match auth_state(parts).await? {
            AuthState::FullyAuthenticated { user } => Ok(Self(user)),
            _ => Err(AuthRejection::RedirectToLogin),
        }
    }
}

impl<S> FromRequestParts<S> for RequirePasswordStep
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match auth_state(parts).await? {
            AuthState::PasswordVerified { user } => Ok(Self(user)),
            _ => Err(AuthRejection::RedirectToLogin),
        }
    }
}

impl<S> FromRequestParts<S> for CurrentAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        auth_state(parts).await.map(Self)
    }
}

/// Store the session's authentication state.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_state(
    session: &Session,
    state: &AuthState,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AUTH_STATE, state).await
}

/// Drop the authentication state from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_state(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<AuthState>(session_keys::AUTH_STATE)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Request, header::LOCATION};
    use branchline_core::{Email, UserId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: UserId::new(9),
            name: "Asha Rao".to_string(),
            email: Email::parse("asha@example.in").unwrap(),
        }
    }

    async fn parts_with(state: Option<AuthState>) -> Parts {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        if let Some(state) = state {
            set_auth_state(&session, &state).await.unwrap();
        }
        let (mut parts, ()) = Request::builder()
            .uri("/dashboard")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(session);
        parts
    }

    fn location(rejection: AuthRejection) -> String {
        let response = rejection.into_response();
        response.headers()[LOCATION].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_full_auth_accepts_authenticated_session() {
        let mut parts = parts_with(Some(AuthState::FullyAuthenticated { user: user() })).await;
        let RequireFullAuth(found) = RequireFullAuth::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(found, user());
    }

    #[tokio::test]
    async fn test_full_auth_redirects_half_finished_login() {
        for state in [None, Some(AuthState::PasswordVerified { user: user() })] {
            let mut parts = parts_with(state).await;
            let Err(rejection) = RequireFullAuth::from_request_parts(&mut parts, &()).await else {
                panic!("expected rejection");
            };
            assert_eq!(location(rejection), LOGIN_PATH);
        }
    }

    #[tokio::test]
    async fn test_password_step_rejects_full_auth() {
        let mut parts = parts_with(Some(AuthState::FullyAuthenticated { user: user() })).await;
        assert!(
            RequirePasswordStep::from_request_parts(&mut parts, &())
                .await
                .is_err()
        );

        let mut parts = parts_with(Some(AuthState::PasswordVerified { user: user() })).await;
        assert!(
            RequirePasswordStep::from_request_parts(&mut parts, &())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_clear_auth_state_signs_out() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set_auth_state(&session, &AuthState::FullyAuthenticated { user: user() })
            .await
            .unwrap();
        clear_auth_state(&session).await.unwrap();

        let mut parts = parts_with(None).await;
        parts.extensions.insert(session);
        let CurrentAuth(state) = CurrentAuth::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(state, AuthState::Anonymous);
    }
}
