//! User repository trait.

use async_trait::async_trait;
use iam_model::User;
use uuid::Uuid;

use crate::error::StorageResult;

/// Repository for user records, scoped to one tenant and realm.
///
/// This is the minimal data-layer surface the flow engine's node library
/// requires: lookup by identifier, create, and update. Implementations
/// must be thread-safe; the engine invokes them sequentially within one
/// step but hosts may serve many sessions concurrently.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by ID.
    async fn get_by_id(&self, id: Uuid) -> StorageResult<Option<User>>;

    /// Gets a user by username.
    async fn get_by_username(&self, username: &str) -> StorageResult<Option<User>>;

    /// Gets a user by email address.
    async fn get_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    /// Creates a new user.
    ///
    /// ## Errors
    ///
    /// Returns [`StorageError::Duplicate`] if a user with the same
    /// username exists.
    ///
    /// [`StorageError::Duplicate`]: crate::error::StorageError::Duplicate
    async fn create(&self, user: &User) -> StorageResult<()>;

    /// Updates an existing user.
    ///
    /// ## Errors
    ///
    /// Returns [`StorageError::NotFound`] if the user doesn't exist.
    ///
    /// [`StorageError::NotFound`]: crate::error::StorageError::NotFound
    async fn update(&self, user: &User) -> StorageResult<()>;
}
