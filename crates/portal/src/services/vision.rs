//! Vision service client.
//!
//! One external service handles face enrolment, face matching, and document
//! field extraction. Every endpoint takes `{name, image}` and answers with
//! `{data, error}`; a non-null `error` means the service refused the image.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use branchline_core::{DocumentKind, UserId};

use crate::config::VisionConfig;
use crate::models::DocumentExtraction;

const REGISTER_FACE: &str = "register/face";
const RECOGNISE_FACE: &str = "recognise/face";
const EXTRACT_DOCUMENT: &str = "extract/document";

/// Errors that can occur when calling the vision service.
#[derive(Debug, Error)]
pub enum VisionError {
    /// The submitted image was not usable base64.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Service answered with an `error` field.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A base64 still image captured by the browser.
///
/// Accepts bare base64 or a `data:image/...;base64,` URL and keeps only the
/// payload, which is what the service decodes.
#[derive(Clone)]
pub struct CapturedImage(String);

impl CapturedImage {
    /// Validate a submitted image.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::InvalidImage` if the payload is empty or not base64.
    pub fn parse(raw: &str) -> Result<Self, VisionError> {
        let raw = raw.trim();
        let payload = match raw.strip_prefix("data:") {
            Some(rest) => rest
                .split_once(";base64,")
                .map(|(_, data)| data)
                .ok_or_else(|| VisionError::InvalidImage("data URL is not base64".to_string()))?,
            None => raw,
        };

        if payload.is_empty() {
            return Err(VisionError::InvalidImage("image is empty".to_string()));
        }
        STANDARD
            .decode(payload)
            .map_err(|e| VisionError::InvalidImage(e.to_string()))?;

        Ok(Self(payload.to_owned()))
    }

    #[must_use]
    pub fn as_base64(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CapturedImage({} bytes)", self.0.len())
    }
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    name: &'a str,
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    error: Option<String>,
}

/// Vision service client.
#[derive(Clone)]
pub struct VisionClient {
    inner: Arc<VisionClientInner>,
}

struct VisionClientInner {
    client: reqwest::Client,
    base: Url,
}

impl VisionClient {
    /// Create a new vision client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &VisionConfig, timeout: Duration) -> Result<Self, VisionError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| VisionError::Parse(format!("Invalid token format: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(VisionClientInner {
                client,
                base: config.url.clone(),
            }),
        })
    }

    /// Enrol a face for `user`.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Rejected` if no face was found in the image.
    #[instrument(skip(self, image), fields(user_id = %user))]
    pub async fn register_face(&self, user: UserId, image: &CapturedImage) -> Result<(), VisionError> {
        self.call(REGISTER_FACE, &user.to_string(), image).await?;
        tracing::info!("face enrolled");
        Ok(())
    }

    /// Match a live capture against the face enrolled for `user`.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Rejected` if the face does not match.
    #[instrument(skip(self, image), fields(user_id = %user))]
    pub async fn recognise_face(&self, user: UserId, image: &CapturedImage) -> Result<(), VisionError> {
        self.call(RECOGNISE_FACE, &user.to_string(), image).await?;
        Ok(())
    }

    /// Extract the fields of an identity document.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Rejected` if the service could not read the image.
    #[instrument(skip(self, image), fields(kind = kind.service_name()))]
    pub async fn extract_document(
        &self,
        kind: DocumentKind,
        image: &CapturedImage,
    ) -> Result<DocumentExtraction, VisionError> {
        let data = self.call(EXTRACT_DOCUMENT, kind.service_name(), image).await?;
        Ok(DocumentExtraction::from_service_data(kind, data))
    }

    async fn call(
        &self,
        endpoint: &str,
        name: &str,
        image: &CapturedImage,
    ) -> Result<Map<String, Value>, VisionError> {
        let url = self
            .inner
            .base
            .join(endpoint)
            .map_err(|e| VisionError::Parse(format!("Invalid endpoint URL: {e}")))?;

        let response = self
            .inner
            .client
            .post(url)
            .json(&ImageRequest {
                name,
                image: image.as_base64(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ServiceResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        if let Some(error) = body.error {
            tracing::warn!(endpoint, error = %error, "vision service rejected image");
            return Err(VisionError::Rejected(error));
        }
        Ok(body.data.unwrap_or_default())
    }
}
