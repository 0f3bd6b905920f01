//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::db::UserStore;
use crate::services::assistant::{AssistantClient, AssistantError};
use crate::services::chat::ChatService;
use crate::services::documents::SubmissionLocks;
use crate::services::vision::{VisionClient, VisionError};

/// Error building the external service clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("vision client: {0}")]
    Vision(#[from] VisionError),
    #[error("assistant client: {0}")]
    Assistant(#[from] AssistantError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    users: Arc<dyn UserStore>,
    vision: VisionClient,
    chat: ChatService,
    document_locks: SubmissionLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Portal configuration
    /// * `users` - User account store
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: PortalConfig, users: Arc<dyn UserStore>) -> Result<Self, StateError> {
        let vision = VisionClient::new(&config.vision, config.service_timeout)?;
        let assistant = AssistantClient::new(config.assistant_url.clone(), config.service_timeout)?;
        let chat = ChatService::new(assistant, vision.clone(), config.chat_idle);
        let document_locks = SubmissionLocks::new(config.chat_idle);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                users,
                vision,
                chat,
                document_locks,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get the user account store.
    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }

    /// Get the vision service client.
    #[must_use]
    pub fn vision(&self) -> &VisionClient {
        &self.inner.vision
    }

    /// Get the chat transcripts.
    #[must_use]
    pub fn chat(&self) -> &ChatService {
        &self.inner.chat
    }

    /// Get the per-user document submission guards.
    #[must_use]
    pub fn document_locks(&self) -> &SubmissionLocks {
        &self.inner.document_locks
    }
}
