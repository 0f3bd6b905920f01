//! Dashboard overview.

use axum::Json;
use serde::Serialize;
use tower_sessions::Session;

use branchline_core::DocumentKind;

use crate::error::Result;
use crate::middleware::RequireFullAuth;
use crate::middleware::session::{load_documents, load_loan};
use crate::models::{LoanStep, SessionUser};

#[derive(Debug, Serialize)]
pub struct LoanProgress {
    pub step: LoanStep,
    pub progress: u8,
}

#[derive(Debug, Serialize)]
pub struct DocumentStatus {
    /// Kind of the document waiting for its counterpart.
    pub pending: Option<DocumentKind>,
    pub verified: bool,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: SessionUser,
    pub loan: LoanProgress,
    pub documents: DocumentStatus,
}

/// Signed-in overview: who, how far the loan wizard is, and document status.
pub async fn index(
    session: Session,
    RequireFullAuth(user): RequireFullAuth,
) -> Result<Json<Dashboard>> {
    let loan = load_loan(&session).await?;
    let documents = load_documents(&session).await?;

    Ok(Json(Dashboard {
        user,
        loan: LoanProgress {
            step: loan.step,
            progress: loan.step.progress(),
        },
        documents: DocumentStatus {
            pending: documents.pending.as_ref().map(|d| d.kind),
            verified: documents.verified.is_some(),
        },
    }))
}
