//! In-process user store.
//!
//! Holds users in a map keyed by normalised email. Used by tests and local
//! demos where no database is available.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use branchline_core::{Email, UserId};

use super::{RepositoryError, UserStore};
use crate::models::user::User;

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: HashMap<String, (User, String)>,
}

/// User store that lives in memory for the lifetime of the process.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users.
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    /// Whether no user has registered yet.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(email.as_str()).map(|(user, _)| user.clone()))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(email.as_str()).cloned())
    }

    async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(email.as_str()) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(inner.next_id),
            name: name.to_owned(),
            email: email.clone(),
            face_enrolled_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(
            email.as_str().to_owned(),
            (user.clone(), password_hash.to_owned()),
        );
        Ok(user)
    }

    async fn claim_face_enrolment(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let (user, _) = inner
            .users
            .values_mut()
            .find(|(user, _)| user.id == id)
            .ok_or(RepositoryError::NotFound)?;

        if user.face_enrolled_at.is_some() {
            return Ok(false);
        }
        user.face_enrolled_at = Some(Utc::now());
        Ok(true)
    }

    async fn release_face_enrolment(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        if let Some((user, _)) = inner.users.values_mut().find(|(user, _)| user.id == id) {
            user.face_enrolled_at = None;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
