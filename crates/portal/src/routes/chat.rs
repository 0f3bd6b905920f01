//! Branch manager chat routes.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Deserialize;

use branchline_core::DocumentKind;

use crate::error::{AppError, Result};
use crate::middleware::RequireFullAuth;
use crate::models::Transcript;
use crate::services::assistant::AudioClip;
use crate::services::vision::CapturedImage;
use crate::state::AppState;

/// Multipart field carrying the recording.
const AUDIO_FIELD: &str = "audio";

/// File name used when the browser sends none.
const DEFAULT_AUDIO_NAME: &str = "recording.webm";

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub document_type: DocumentKind,
    pub image: String,
}

/// The transcript and whether a reply is outstanding.
pub async fn show(
    State(state): State<AppState>,
    RequireFullAuth(user): RequireFullAuth,
) -> Json<Transcript> {
    Json(state.chat().snapshot(user.id).await)
}

pub async fn send_text(
    State(state): State<AppState>,
    RequireFullAuth(user): RequireFullAuth,
    Json(form): Json<TextRequest>,
) -> Result<Json<Transcript>> {
    Ok(Json(state.chat().send_text(user.id, &form.text).await?))
}

/// Voice question, sent as multipart with the recording in `audio`.
pub async fn send_audio(
    State(state): State<AppState>,
    RequireFullAuth(user): RequireFullAuth,
    mut multipart: Multipart,
) -> Result<Json<Transcript>> {
    let mut clip = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map_or_else(|| DEFAULT_AUDIO_NAME.to_string(), String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        clip = Some(AudioClip {
            bytes: bytes.to_vec(),
            file_name,
            content_type,
        });
        break;
    }

    let clip = clip.ok_or_else(|| AppError::BadRequest(format!("missing {AUDIO_FIELD} field")))?;
    Ok(Json(state.chat().send_audio(user.id, clip).await?))
}

/// Show an identity document to the branch manager.
pub async fn send_document(
    State(state): State<AppState>,
    RequireFullAuth(user): RequireFullAuth,
    Json(form): Json<DocumentRequest>,
) -> Result<Json<Transcript>> {
    let image = CapturedImage::parse(&form.image)?;
    Ok(Json(
        state
            .chat()
            .send_document(user.id, form.document_type, image)
            .await?,
    ))
}
