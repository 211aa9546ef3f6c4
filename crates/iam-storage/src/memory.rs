//! In-memory user repository.
//!
//! Backs tests and embedded hosts; production deployments supply their
//! own implementation against a real store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use iam_model::User;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::user::UserRepository;

/// A thread-safe, map-backed user repository.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn create(&self, user: &User) -> StorageResult<()> {
        let mut users = self.users.write();
        if users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Duplicate(user.username.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> StorageResult<()> {
        let mut users = self.users.write();
        let Some(existing) = users.get_mut(&user.id) else {
            return Err(StorageError::NotFound(user.id.to_string()));
        };
        *existing = user.clone();
        existing.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_lookup() {
        let repo = InMemoryUserRepository::new();
        let user = User::new("acme", "customers", "alice").with_email("alice@example.com");

        repo.create(&user).await.unwrap();
        assert_eq!(repo.len(), 1);

        let by_name = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        let by_email = repo.get_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        assert!(repo.get_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(&User::new("acme", "customers", "alice"))
            .await
            .unwrap();

        let result = repo.create(&User::new("acme", "customers", "alice")).await;
        assert!(matches!(result, Err(StorageError::Duplicate(_))));
    }

    #[tokio::test]
    async fn update_requires_existing_user() {
        let repo = InMemoryUserRepository::new();
        let user = User::new("acme", "customers", "alice");

        let result = repo.update(&user).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        repo.create(&user).await.unwrap();
        let mut changed = user.clone();
        changed.email = Some("alice@example.com".to_string());
        repo.update(&changed).await.unwrap();

        let stored = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.email.as_deref(), Some("alice@example.com"));
    }
}
