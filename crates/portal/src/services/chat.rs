//! Per-user chat transcripts with the branch manager.
//!
//! Transcripts live in process memory, keyed by user, and are evicted after
//! an idle period or on logout. Each transcript allows one outstanding
//! request: the `processing` flag is claimed under the transcript lock, the
//! lock is released for the external call, and the reply is appended when it
//! arrives.
//!
//! The exchange runs on its own task so a client that disconnects mid-call
//! still leaves the transcript with a reply and the flag cleared.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;

use branchline_core::{DocumentKind, UserId};

use super::FlowError;
use super::assistant::{AssistantClient, AudioClip};
use super::vision::{CapturedImage, VisionClient};
use crate::models::chat::{ChatMessage, FALLBACK_REPLY, Role, Transcript};

/// Upper bound on concurrently held transcripts.
const MAX_TRANSCRIPTS: u64 = 10_000;

/// User message recorded when a voice question could not be transcribed.
pub const VOICE_PLACEHOLDER: &str = "[Voice message]";

/// Assistant reply attached to an extracted document.
pub const DOCUMENT_REVIEWED: &str = "I've analyzed your document. This appears to be a valid ID. \
     Would you like me to register this for your account?";

type SharedTranscript = Arc<Mutex<Transcript>>;

/// Chat shell over the assistant and vision services.
#[derive(Clone)]
pub struct ChatService {
    transcripts: Cache<UserId, SharedTranscript>,
    assistant: AssistantClient,
    vision: VisionClient,
}

impl ChatService {
    #[must_use]
    pub fn new(assistant: AssistantClient, vision: VisionClient, idle: Duration) -> Self {
        let transcripts = Cache::builder()
            .max_capacity(MAX_TRANSCRIPTS)
            .time_to_idle(idle)
            .build();
        Self {
            transcripts,
            assistant,
            vision,
        }
    }

    async fn transcript(&self, user: UserId) -> SharedTranscript {
        self.transcripts
            .get_with(user, async { Arc::new(Mutex::new(Transcript::new())) })
            .await
    }

    /// Current transcript for `user`, greeting included.
    pub async fn snapshot(&self, user: UserId) -> Transcript {
        self.transcript(user).await.lock().await.clone()
    }

    /// Drop the transcript for `user`.
    pub async fn forget(&self, user: UserId) {
        self.transcripts.invalidate(&user).await;
    }

    /// Send a typed message and wait for the reply.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::EmptyMessage` for blank text (nothing is appended)
    /// and `FlowError::ChatBusy` while a previous request is outstanding.
    pub async fn send_text(&self, user: UserId, text: &str) -> Result<Transcript, FlowError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FlowError::EmptyMessage);
        }

        let transcript = self.transcript(user).await;
        {
            let mut guard = transcript.lock().await;
            if !guard.begin() {
                return Err(FlowError::ChatBusy);
            }
            guard.push(ChatMessage::new(Role::User, text));
        }

        let assistant = self.assistant.clone();
        let question = text.to_owned();
        let shared = Arc::clone(&transcript);
        run_detached(async move {
            let reply = match assistant.ask_text(user, &question).await {
                Ok(response) => ChatMessage::new(Role::Assistant, response),
                Err(e) => {
                    tracing::warn!(user_id = %user, error = %e, "assistant text query failed");
                    ChatMessage::new(Role::Assistant, FALLBACK_REPLY)
                }
            };
            shared.lock().await.finish(reply);
        })
        .await;

        Ok(transcript.lock().await.clone())
    }

    /// Send a recorded question and wait for the spoken reply.
    ///
    /// The user message is appended as [`VOICE_PLACEHOLDER`] when the request
    /// starts and takes the transcription once the assistant answers. A blank
    /// or failed transcription leaves the placeholder in place.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::EmptyMessage` for an empty recording and
    /// `FlowError::ChatBusy` while a previous request is outstanding.
    pub async fn send_audio(&self, user: UserId, clip: AudioClip) -> Result<Transcript, FlowError> {
        if clip.bytes.is_empty() {
            return Err(FlowError::EmptyMessage);
        }

        let transcript = self.transcript(user).await;
        let question = ChatMessage::new(Role::User, VOICE_PLACEHOLDER);
        let question_id = question.id;
        {
            let mut guard = transcript.lock().await;
            if !guard.begin() {
                return Err(FlowError::ChatBusy);
            }
            guard.push(question);
        }

        let assistant = self.assistant.clone();
        let shared = Arc::clone(&transcript);
        run_detached(async move {
            let (heard, reply) = match assistant.ask_audio(user, clip).await {
                Ok(spoken) => {
                    let heard = Some(spoken.transcription).filter(|t| !t.trim().is_empty());
                    let reply = ChatMessage::new(Role::Assistant, spoken.response)
                        .with_audio(spoken.audio_url);
                    (heard, reply)
                }
                Err(e) => {
                    tracing::warn!(user_id = %user, error = %e, "assistant audio query failed");
                    (None, ChatMessage::new(Role::Assistant, FALLBACK_REPLY))
                }
            };
            let mut guard = shared.lock().await;
            if let Some(heard) = heard {
                guard.revise(question_id, heard);
            }
            guard.finish(reply);
        })
        .await;

        Ok(transcript.lock().await.clone())
    }

    /// Show an identity document to the branch manager.
    ///
    /// The extraction result is attached to a single assistant message.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::ChatBusy` while a previous request is outstanding.
    pub async fn send_document(
        &self,
        user: UserId,
        kind: DocumentKind,
        image: CapturedImage,
    ) -> Result<Transcript, FlowError> {
        let transcript = self.transcript(user).await;
        if !transcript.lock().await.begin() {
            return Err(FlowError::ChatBusy);
        }

        let vision = self.vision.clone();
        let shared = Arc::clone(&transcript);
        run_detached(async move {
            let reply = match vision.extract_document(kind, &image).await {
                Ok(document) => {
                    ChatMessage::new(Role::Assistant, DOCUMENT_REVIEWED).with_attachment(document)
                }
                Err(e) => {
                    tracing::warn!(user_id = %user, error = %e, "document extraction failed");
                    ChatMessage::new(Role::Assistant, FALLBACK_REPLY)
                }
            };
            shared.lock().await.finish(reply);
        })
        .await;

        Ok(transcript.lock().await.clone())
    }
}

/// Run `exchange` to completion even if the caller goes away.
async fn run_detached<F>(exchange: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Err(e) = tokio::spawn(exchange).await {
        tracing::error!(error = %e, "chat exchange task failed");
    }
}
