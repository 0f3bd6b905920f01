//! Branch manager chat transcript.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::document::DocumentExtraction;

/// Opening message of every transcript.
pub const GREETING: &str = "Hello! I'm your virtual branch manager. How can I assist you today?";

/// Assistant reply used when the assistant service fails.
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't process your request right now. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Spoken reply, as an absolute URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Document shown to the branch manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<DocumentExtraction>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            audio: None,
            attachment: None,
        }
    }

    #[must_use]
    pub fn with_audio(mut self, url: Option<String>) -> Self {
        self.audio = url;
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, document: DocumentExtraction) -> Self {
        self.attachment = Some(document);
        self
    }
}

/// Append-only message log with the single-request flag.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    processing: bool,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// A transcript holding only the greeting.
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::Assistant, GREETING)],
            processing: false,
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replace the content of the message with `id`, if it is still present.
    pub fn revise(&mut self, id: Uuid, content: impl Into<String>) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.content = content.into();
        }
    }

    /// Claim the request slot. Returns `false` if one is already outstanding.
    pub const fn begin(&mut self) -> bool {
        if self.processing {
            return false;
        }
        self.processing = true;
        true
    }

    /// Release the request slot after appending `reply`.
    pub fn finish(&mut self, reply: ChatMessage) {
        self.messages.push(reply);
        self.processing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transcript_is_greeted() {
        let transcript = Transcript::new();
        assert_eq!(transcript.messages().len(), 1);
        assert_eq!(transcript.messages()[0].role, Role::Assistant);
        assert_eq!(transcript.messages()[0].content, GREETING);
        assert!(!transcript.is_processing());
    }

    #[test]
    fn test_single_outstanding_request() {
        let mut transcript = Transcript::new();
        assert!(transcript.begin());
        assert!(!transcript.begin());

        transcript.finish(ChatMessage::new(Role::Assistant, "done"));
        assert!(!transcript.is_processing());
        assert!(transcript.begin());
    }

    #[test]
    fn test_revise_keeps_position() {
        let mut transcript = Transcript::new();
        let question = ChatMessage::new(Role::User, "[Voice message]");
        let id = question.id;
        transcript.push(question);
        transcript.push(ChatMessage::new(Role::Assistant, "reply"));

        transcript.revise(id, "What is my balance?");
        assert_eq!(transcript.messages()[1].content, "What is my balance?");
        assert_eq!(transcript.messages()[2].content, "reply");
    }
}
