//! Loan application wizard routes.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tower_sessions::Session;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireFullAuth;
use crate::middleware::session::{load_documents, load_loan, store_loan};
use crate::models::{LoanApplication, UploadSlot};
use crate::services::loan::{self, ApplicationForm, SUBMIT_REDIRECT};
use crate::state::AppState;

/// The application plus its progress indicator.
#[derive(Debug, Serialize)]
pub struct LoanView {
    pub application: LoanApplication,
    pub progress: u8,
}

impl From<LoanApplication> for LoanView {
    fn from(application: LoanApplication) -> Self {
        Self {
            progress: application.step.progress(),
            application,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Submitted {
    pub form: ApplicationForm,
    pub redirect: &'static str,
}

pub async fn show(
    session: Session,
    RequireFullAuth(_user): RequireFullAuth,
) -> Result<Json<LoanView>> {
    Ok(Json(load_loan(&session).await?.into()))
}

/// Record the current step's payload and advance.
pub async fn next(
    session: Session,
    RequireFullAuth(_user): RequireFullAuth,
    Json(payload): Json<Value>,
) -> Result<Json<LoanView>> {
    let mut application = load_loan(&session).await?;
    loan::advance(&mut application, payload)?;
    store_loan(&session, &application).await?;
    Ok(Json(application.into()))
}

pub async fn back(
    session: Session,
    RequireFullAuth(_user): RequireFullAuth,
) -> Result<Json<LoanView>> {
    let mut application = load_loan(&session).await?;
    loan::back(&mut application);
    store_loan(&session, &application).await?;
    Ok(Json(application.into()))
}

/// Simulated supporting document upload, acknowledged after a fixed delay.
pub async fn upload(
    State(state): State<AppState>,
    session: Session,
    RequireFullAuth(_user): RequireFullAuth,
    Path(slot): Path<UploadSlot>,
) -> Result<Json<LoanView>> {
    let mut application = load_loan(&session).await?;
    loan::record_upload(&mut application, slot)?;

    tokio::time::sleep(state.config().loan_upload_ack).await;

    store_loan(&session, &application).await?;
    Ok(Json(application.into()))
}

/// Generate the application form and start over.
pub async fn submit(
    session: Session,
    RequireFullAuth(user): RequireFullAuth,
) -> Result<Json<Submitted>> {
    let application = load_loan(&session).await?;
    let documents = load_documents(&session).await?;

    let form = loan::submit(&application, &documents, &user, Utc::now())?;
    store_loan(&session, &LoanApplication::default()).await?;

    add_breadcrumb("loan", "Application submitted", None);
    Ok(Json(Submitted {
        form,
        redirect: SUBMIT_REDIRECT,
    }))
}

pub async fn reset(
    session: Session,
    RequireFullAuth(_user): RequireFullAuth,
) -> Result<Json<LoanView>> {
    let application = LoanApplication::default();
    store_loan(&session, &application).await?;
    Ok(Json(application.into()))
}
