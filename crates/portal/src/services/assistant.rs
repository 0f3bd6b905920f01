//! Branch manager assistant client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use branchline_core::UserId;

/// Errors that can occur when calling the assistant.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Serialize)]
struct TextQuery<'a> {
    user_id: i64,
    text: &'a str,
}

#[derive(Deserialize)]
struct TextResponse {
    response: String,
}

#[derive(Deserialize)]
struct AudioResponse {
    #[serde(default)]
    transcription: String,
    response: String,
    #[serde(default)]
    audio_url: Option<String>,
}

/// Recorded audio submitted from the browser.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

/// Reply to a spoken question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenReply {
    /// What the assistant heard.
    pub transcription: String,
    /// What the assistant said.
    pub response: String,
    /// Absolute URL of the synthesised reply, if one was produced.
    pub audio_url: Option<String>,
}

/// Assistant service client.
#[derive(Clone)]
pub struct AssistantClient {
    inner: Arc<AssistantClientInner>,
}

struct AssistantClientInner {
    client: reqwest::Client,
    base: Url,
}

impl AssistantClient {
    /// Create a new assistant client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(AssistantClientInner { client, base }),
        })
    }

    /// Ask a typed question.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the reply cannot be parsed.
    #[instrument(skip(self, text), fields(user_id = %user))]
    pub async fn ask_text(&self, user: UserId, text: &str) -> Result<String, AssistantError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("query/text")?)
            .json(&TextQuery {
                user_id: user.as_i64(),
                text,
            })
            .send()
            .await?;

        let reply: TextResponse = Self::parse(response).await?;
        Ok(reply.response)
    }

    /// Ask a spoken question.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the reply cannot be parsed.
    #[instrument(skip(self, clip), fields(user_id = %user, bytes = clip.bytes.len()))]
    pub async fn ask_audio(&self, user: UserId, clip: AudioClip) -> Result<SpokenReply, AssistantError> {
        let mut part = Part::bytes(clip.bytes).file_name(clip.file_name);
        if let Some(content_type) = clip.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .text("user_id", user.to_string())
            .part("audio_file", part);

        let response = self
            .inner
            .client
            .post(self.endpoint("query/audio")?)
            .multipart(form)
            .send()
            .await?;

        let reply: AudioResponse = Self::parse(response).await?;
        let audio_url = reply
            .audio_url
            .filter(|u| !u.trim().is_empty())
            .map(|u| self.audio_url(&u))
            .transpose()?;

        Ok(SpokenReply {
            transcription: reply.transcription,
            response: reply.response,
            audio_url,
        })
    }

    /// Resolve an audio reference against `{base}/audio/`.
    fn audio_url(&self, reference: &str) -> Result<String, AssistantError> {
        self.endpoint("audio/")?
            .join(reference.trim_start_matches('/'))
            .map(String::from)
            .map_err(|e| AssistantError::Parse(format!("Invalid audio reference: {e}")))
    }

    fn endpoint(&self, path: &str) -> Result<Url, AssistantError> {
        self.inner
            .base
            .join(path)
            .map_err(|e| AssistantError::Parse(format!("Invalid endpoint URL: {e}")))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, AssistantError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| AssistantError::Parse(e.to_string()))
    }
}
