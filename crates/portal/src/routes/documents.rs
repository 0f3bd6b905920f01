//! Identity document cross-check routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;

use branchline_core::DocumentKind;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireFullAuth;
use crate::middleware::session::{load_documents, store_documents};
use crate::models::{CrossCheckOutcome, DocumentState};
use crate::services::FlowError;
use crate::services::documents;
use crate::services::vision::CapturedImage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub document_type: DocumentKind,
    pub image: String,
}

/// Report the pending and verified documents.
pub async fn show(
    session: Session,
    RequireFullAuth(_user): RequireFullAuth,
) -> Result<Json<DocumentState>> {
    Ok(Json(load_documents(&session).await?))
}

/// Extract one document and cross-check it.
///
/// A mismatch is a normal `rejected` outcome, not an error. Extraction
/// failures store nothing. A second submission while one is running is
/// refused with 409.
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireFullAuth(user): RequireFullAuth,
    Json(form): Json<DocumentRequest>,
) -> Result<Json<CrossCheckOutcome>> {
    let image = CapturedImage::parse(&form.image)?;
    let _slot = state.document_locks().try_acquire(user.id).await?;

    let mut documents = load_documents(&session).await?;
    if documents.verified.is_some() {
        return Err(FlowError::DocumentsAlreadyVerified.into());
    }

    let extraction = state
        .vision()
        .extract_document(form.document_type, &image)
        .await?;

    let outcome = documents::submit(&mut documents, &user.name, extraction)?;
    store_documents(&session, &documents).await?;

    add_breadcrumb(
        "documents",
        "Document submitted",
        Some(&[("kind", form.document_type.service_name())]),
    );
    Ok(Json(outcome))
}

/// Discard both documents.
pub async fn reset(
    session: Session,
    RequireFullAuth(_user): RequireFullAuth,
) -> Result<StatusCode> {
    store_documents(&session, &DocumentState::default()).await?;
    Ok(StatusCode::NO_CONTENT)
}
