//! Collaborator bundle handed to the flow engine.

use std::sync::Arc;

use crate::memory::InMemoryUserRepository;
use crate::user::UserRepository;

/// The data-layer collaborators node handlers may use.
///
/// Constructed by the host per tenant and realm; the engine threads it
/// through every handler invocation unchanged.
#[derive(Clone)]
pub struct Repositories {
    /// User record repository.
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// Creates a bundle around the given user repository.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Creates a bundle backed entirely by in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
