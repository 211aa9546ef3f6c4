//! User management node types.

use async_trait::async_trait;
use iam_model::{NodeType, User};
use iam_storage::{Repositories, StorageError};

use crate::error::EngineResult;
use crate::handler::{NodeHandler, NodeOutcome, StepContext};
use crate::nodes::{keys, labels};
use crate::password::PasswordHasherService;
use crate::registry::NodeDefinition;

const DEFAULT_TENANT: &str = "default";
const DEFAULT_REALM: &str = "default";

/// Creates a user record from the accumulated context.
///
/// Enrolls a password credential when the context carries one. A
/// concurrent registration of the same username surfaces as the `fail`
/// edge, not an error.
#[derive(Debug, Clone)]
pub struct CreateUserHandler {
    hasher: PasswordHasherService,
}

impl Default for CreateUserHandler {
    fn default() -> Self {
        Self::new(PasswordHasherService::with_defaults())
    }
}

impl CreateUserHandler {
    /// Creates the handler using the given hasher.
    #[must_use]
    pub const fn new(hasher: PasswordHasherService) -> Self {
        Self { hasher }
    }
}

#[async_trait]
impl NodeHandler for CreateUserHandler {
    async fn run(&self, step: &StepContext<'_>, repos: &Repositories) -> EngineResult<NodeOutcome> {
        let username = step.context_value(keys::USERNAME).unwrap_or_default();
        if username.is_empty() {
            return Ok(NodeOutcome::condition(labels::FAIL));
        }
        if repos.users.get_by_username(username).await?.is_some() {
            return Ok(NodeOutcome::condition(labels::FAIL));
        }

        let tenant = step.config("tenant").unwrap_or(DEFAULT_TENANT);
        let realm = step.config("realm").unwrap_or(DEFAULT_REALM);
        let mut user = User::new(tenant, realm, username);
        if let Some(email) = step.context_value(keys::EMAIL).filter(|e| !e.is_empty()) {
            user = user.with_email(email);
        }
        if let Some(password) = step
            .context_value(keys::PASSWORD)
            .filter(|p| !p.is_empty())
        {
            user = user.with_password_hash(self.hasher.hash(password)?);
        }

        match repos.users.create(&user).await {
            Ok(()) => {
                tracing::debug!(username = %user.username, user_id = %user.id, "user created");
                Ok(NodeOutcome::condition_with(
                    labels::SUCCESS,
                    [(keys::USER_ID.to_string(), user.id.to_string())],
                ))
            }
            // Lost a race with another registration of the same name.
            Err(StorageError::Duplicate(_)) => Ok(NodeOutcome::condition(labels::FAIL)),
            Err(error) => Err(error.into()),
        }
    }
}

/// Definition for the `createUser` node type.
#[must_use]
pub fn create_user_definition() -> NodeDefinition {
    NodeDefinition::new("createUser", NodeType::Logic)
        .describe(
            "Create User",
            "Registers a new user from the collected context",
            "User",
        )
        .requires(&[keys::USERNAME])
        .outputs(&[keys::USER_ID])
        .conditions(&[labels::SUCCESS, labels::FAIL])
        .config_option("tenant", "Tenant for the new user (default 'default')")
        .config_option("realm", "Realm for the new user (default 'default')")
        .handler(CreateUserHandler::default())
}
