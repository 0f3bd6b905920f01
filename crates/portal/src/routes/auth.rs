//! Authentication route handlers.
//!
//! Two-factor login (password, then face), registration with face
//! enrolment, and logout. Responses are JSON except logout, which redirects.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{CurrentAuth, RequirePasswordStep, clear_auth_state, set_auth_state};
use crate::models::{AuthState, LoginStep, SessionUser};
use crate::services::auth::{AuthError, AuthService};
use crate::services::vision::{CapturedImage, VisionError};
use crate::state::AppState;

/// Where a fully authenticated browser goes.
pub const DASHBOARD_PATH: &str = "/dashboard";

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A still image captured by the browser camera.
#[derive(Debug, Deserialize)]
pub struct FaceRequest {
    pub image: String,
}

/// Where the login flow stands.
#[derive(Debug, Serialize)]
pub struct LoginStatus {
    pub step: LoginStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

impl LoginStatus {
    fn for_step(step: LoginStep) -> Self {
        let redirect = (step == LoginStep::Authenticated).then_some(DASHBOARD_PATH);
        Self { step, redirect }
    }
}

#[derive(Debug, Serialize)]
pub struct Registered {
    pub user: SessionUser,
    pub step: LoginStep,
}

// =============================================================================
// Login
// =============================================================================

/// Report the current login step.
pub async fn login_status(CurrentAuth(auth): CurrentAuth) -> Json<LoginStatus> {
    Json(LoginStatus::for_step(auth.step()))
}

/// Password step.
///
/// Only an anonymous session may submit a password; a half-finished login
/// must continue with the face step or log out.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    CurrentAuth(auth): CurrentAuth,
    Json(form): Json<LoginRequest>,
) -> Result<Json<LoginStatus>> {
    match auth {
        AuthState::Anonymous => {}
        AuthState::PasswordVerified { .. } => return Err(AuthError::PasswordStepCompleted.into()),
        AuthState::FullyAuthenticated { .. } => return Err(AuthError::AlreadyAuthenticated.into()),
    }

    let user = AuthService::new(state.users())
        .login_with_password(&form.email, &form.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "password step failed"))?;

    session.cycle_id().await?;
    set_auth_state(
        &session,
        &AuthState::PasswordVerified {
            user: SessionUser::from(&user),
        },
    )
    .await?;

    add_breadcrumb("auth", "Password verified", None);
    tracing::info!(user_id = %user.id, "password step passed");
    Ok(Json(LoginStatus::for_step(LoginStep::Face)))
}

/// Face step.
///
/// On a match the session becomes fully authenticated. A failed match keeps
/// the session at the face step.
pub async fn face(
    State(state): State<AppState>,
    session: Session,
    RequirePasswordStep(user): RequirePasswordStep,
    Json(form): Json<FaceRequest>,
) -> Result<Json<LoginStatus>> {
    let image = CapturedImage::parse(&form.image)?;

    state
        .vision()
        .recognise_face(user.id, &image)
        .await
        .map_err(|e| match e {
            VisionError::Rejected(reason) => AppError::Auth(AuthError::FaceNotRecognised(reason)),
            other => AppError::Vision(other),
        })?;

    session.cycle_id().await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    set_auth_state(&session, &AuthState::FullyAuthenticated { user: user.clone() }).await?;

    add_breadcrumb("auth", "Face verified", None);
    tracing::info!(user_id = %user.id, "login complete");
    Ok(Json(LoginStatus::for_step(LoginStep::Authenticated)))
}

// =============================================================================
// Registration
// =============================================================================

/// Create an account and move the session to the face step.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    CurrentAuth(auth): CurrentAuth,
    Json(form): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    if auth.is_fully_authenticated() {
        return Err(AuthError::AlreadyAuthenticated.into());
    }

    let user = AuthService::new(state.users())
        .register(&form.name, &form.email, &form.password)
        .await?;

    let user = SessionUser::from(&user);
    session.cycle_id().await?;
    set_auth_state(&session, &AuthState::PasswordVerified { user: user.clone() }).await?;

    add_breadcrumb("auth", "Registered", None);
    Ok((
        StatusCode::CREATED,
        Json(Registered {
            user,
            step: LoginStep::Face,
        }),
    ))
}

/// Enrol the face of a password-verified user who has none yet.
///
/// An account with an enrolled face is refused with 409. Enrolment does not
/// complete the login; the face step still follows.
pub async fn register_face(
    State(state): State<AppState>,
    RequirePasswordStep(user): RequirePasswordStep,
    Json(form): Json<FaceRequest>,
) -> Result<Json<LoginStatus>> {
    let image = CapturedImage::parse(&form.image)?;

    let auth = AuthService::new(state.users());
    auth.begin_face_enrolment(user.id).await?;

    if let Err(e) = state.vision().register_face(user.id, &image).await {
        auth.abandon_face_enrolment(user.id).await?;
        return Err(match e {
            VisionError::Rejected(reason) => AppError::Auth(AuthError::FaceEnrolmentFailed(reason)),
            other => AppError::Vision(other),
        });
    }

    add_breadcrumb("auth", "Face enrolled", None);
    Ok(Json(LoginStatus::for_step(LoginStep::Face)))
}

// =============================================================================
// Logout
// =============================================================================

/// Drop the chat transcript and the whole session.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    CurrentAuth(auth): CurrentAuth,
) -> Result<Redirect> {
    if let Some(user) = auth.user() {
        state.chat().forget(user.id).await;
        tracing::info!(user_id = %user.id, "logged out");
    }

    clear_auth_state(&session).await?;
    session.flush().await?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}
