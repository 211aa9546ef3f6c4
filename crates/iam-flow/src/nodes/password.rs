//! Password node types.
//!
//! Credential collection, validation with lockout counters, and password
//! updates. Validation treats wrong credentials as flow outcomes, never
//! errors; only unavailable collaborators or broken configuration abort
//! the step.

use async_trait::async_trait;
use iam_model::{NodeType, PromptKind, User};
use iam_storage::Repositories;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::handler::{NodeHandler, NodeOutcome, StepContext};
use crate::nodes::{keys, labels};
use crate::password::PasswordHasherService;
use crate::registry::NodeDefinition;

/// Default lockout threshold when no override is configured.
const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 10;

/// Definition for the `askPassword` node type.
#[must_use]
pub fn ask_password_definition() -> NodeDefinition {
    NodeDefinition::new("askPassword", NodeType::Query)
        .describe("Ask Password", "Prompts the user for a password", "Password")
        .prompt(keys::PASSWORD, PromptKind::Password)
        .outputs(&[keys::PASSWORD])
        .conditions(&[labels::SUBMITTED])
}

/// Definition for the `askUsernamePassword` node type.
///
/// Collects both credentials in one step; partial input re-prompts for
/// the full set.
#[must_use]
pub fn ask_username_password_definition() -> NodeDefinition {
    NodeDefinition::new("askUsernamePassword", NodeType::Query)
        .describe(
            "Ask Username and Password",
            "Prompts for username and password together",
            "Password",
        )
        .prompt(keys::USERNAME, PromptKind::Text)
        .prompt(keys::PASSWORD, PromptKind::Password)
        .outputs(&[keys::USERNAME, keys::PASSWORD])
        .conditions(&[labels::SUBMITTED])
}

/// Validates the collected credentials against the user store.
///
/// Maintains the per-user failed-attempt counter and lockout flag.
/// Counter updates are best effort: a store that rejects the write does
/// not change the emitted condition.
#[derive(Debug, Clone)]
pub struct ValidateUsernamePasswordHandler {
    hasher: PasswordHasherService,
}

impl Default for ValidateUsernamePasswordHandler {
    fn default() -> Self {
        Self::new(PasswordHasherService::with_defaults())
    }
}

impl ValidateUsernamePasswordHandler {
    /// Creates a validator using the given hasher.
    #[must_use]
    pub const fn new(hasher: PasswordHasherService) -> Self {
        Self { hasher }
    }

    fn max_attempts(step: &StepContext<'_>) -> EngineResult<u32> {
        match step.config("max_failed_password_attempts") {
            None => Ok(DEFAULT_MAX_FAILED_ATTEMPTS),
            Some(raw) => raw.parse().map_err(|_| EngineError::Config {
                node: step.node.name.clone(),
                message: format!("invalid max_failed_password_attempts '{raw}'"),
            }),
        }
    }

    async fn lookup(
        step: &StepContext<'_>,
        repos: &Repositories,
    ) -> EngineResult<Option<User>> {
        match step.config("user_lookup_method").unwrap_or("username") {
            "username" => {
                let username = step.context_value(keys::USERNAME).unwrap_or_default();
                Ok(repos.users.get_by_username(username).await?)
            }
            "email" => {
                let email = step.context_value(keys::EMAIL).unwrap_or_default();
                Ok(repos.users.get_by_email(email).await?)
            }
            other => Err(EngineError::Config {
                node: step.node.name.clone(),
                message: format!("unknown user_lookup_method '{other}'"),
            }),
        }
    }
}

#[async_trait]
impl NodeHandler for ValidateUsernamePasswordHandler {
    async fn run(&self, step: &StepContext<'_>, repos: &Repositories) -> EngineResult<NodeOutcome> {
        let max_attempts = Self::max_attempts(step)?;
        let password = step.context_value(keys::PASSWORD).unwrap_or_default();

        let Some(mut user) = Self::lookup(step, repos).await? else {
            return Ok(NodeOutcome::condition(labels::FAIL));
        };

        if !user.enabled || user.password_locked || user.failed_login_attempts >= max_attempts {
            return Ok(NodeOutcome::condition(labels::LOCKED));
        }
        let Some(hash) = user.password_hash.clone() else {
            return Ok(NodeOutcome::condition(labels::NO_PASSWORD));
        };

        if self.hasher.verify(password, &hash)? {
            user.record_successful_login();
            if let Err(error) = repos.users.update(&user).await {
                tracing::warn!(username = %user.username, %error, "failed to reset lockout state");
            }
            Ok(NodeOutcome::condition_with(
                labels::SUCCESS,
                [
                    (keys::USER_ID.to_string(), user.id.to_string()),
                    (keys::USERNAME.to_string(), user.username.clone()),
                    (keys::AUTH_LEVEL.to_string(), "1".to_string()),
                ],
            ))
        } else {
            user.record_failed_login(max_attempts);
            let locked = user.password_locked;
            if let Err(error) = repos.users.update(&user).await {
                tracing::warn!(username = %user.username, %error, "failed to persist lockout counter");
            }
            Ok(NodeOutcome::condition(if locked {
                labels::LOCKED
            } else {
                labels::FAIL
            }))
        }
    }
}

/// Definition for the `validateUsernamePassword` node type.
#[must_use]
pub fn validate_username_password_definition() -> NodeDefinition {
    NodeDefinition::new("validateUsernamePassword", NodeType::Logic)
        .describe(
            "Validate Username and Password",
            "Verifies the collected credentials against the user store",
            "Password",
        )
        .requires(&[keys::USERNAME, keys::PASSWORD])
        .outputs(&[keys::USER_ID, keys::USERNAME, keys::AUTH_LEVEL])
        .conditions(&[
            labels::SUCCESS,
            labels::FAIL,
            labels::LOCKED,
            labels::NO_PASSWORD,
        ])
        .config_option(
            "max_failed_password_attempts",
            "Lockout threshold (default 10)",
        )
        .config_option(
            "user_lookup_method",
            "How to resolve the user: username (default) or email",
        )
        .handler(ValidateUsernamePasswordHandler::default())
}

/// Enrolls or replaces a user's password credential.
///
/// Prompts for the password when neither the step inputs nor the context
/// carry one.
#[derive(Debug, Clone)]
pub struct UpdatePasswordHandler {
    hasher: PasswordHasherService,
}

impl Default for UpdatePasswordHandler {
    fn default() -> Self {
        Self::new(PasswordHasherService::with_defaults())
    }
}

impl UpdatePasswordHandler {
    /// Creates an update handler using the given hasher.
    #[must_use]
    pub const fn new(hasher: PasswordHasherService) -> Self {
        Self { hasher }
    }

    async fn resolve_user(
        step: &StepContext<'_>,
        repos: &Repositories,
    ) -> EngineResult<User> {
        if let Some(raw) = step.context_value(keys::USER_ID) {
            let id = Uuid::parse_str(raw).map_err(|_| {
                EngineError::Handler(format!("malformed user_id '{raw}' in context"))
            })?;
            if let Some(user) = repos.users.get_by_id(id).await? {
                return Ok(user);
            }
        } else if let Some(username) = step.context_value(keys::USERNAME) {
            if let Some(user) = repos.users.get_by_username(username).await? {
                return Ok(user);
            }
        }
        Err(EngineError::Handler(
            "no resolvable user for password update".to_string(),
        ))
    }
}

#[async_trait]
impl NodeHandler for UpdatePasswordHandler {
    async fn run(&self, step: &StepContext<'_>, repos: &Repositories) -> EngineResult<NodeOutcome> {
        let Some(password) = step
            .input(keys::PASSWORD)
            .or_else(|| step.context_value(keys::PASSWORD))
            .filter(|p| !p.is_empty())
        else {
            return Ok(NodeOutcome::prompt([(keys::PASSWORD, PromptKind::Password)]));
        };

        let mut user = Self::resolve_user(step, repos).await?;
        user.password_hash = Some(self.hasher.hash(password)?);
        user.password_locked = false;
        user.failed_login_attempts = 0;
        repos.users.update(&user).await?;

        tracing::debug!(username = %user.username, "password credential updated");
        Ok(NodeOutcome::condition(labels::SUCCESS))
    }
}

/// Definition for the `updatePassword` node type.
#[must_use]
pub fn update_password_definition() -> NodeDefinition {
    NodeDefinition::new("updatePassword", NodeType::QueryWithLogic)
        .describe(
            "Update Password",
            "Hashes and stores a new password for the resolved user",
            "Password",
        )
        .prompt(keys::PASSWORD, PromptKind::Password)
        .requires(&[keys::USER_ID])
        .conditions(&[labels::SUBMITTED, labels::SUCCESS])
        .handler(UpdatePasswordHandler::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::PasswordPolicy;
    use iam_model::GraphNode;
    use std::collections::{BTreeMap, HashMap};

    fn fast_hasher() -> PasswordHasherService {
        PasswordHasherService::new(
            &PasswordPolicy::new()
                .memory_cost(8)
                .time_cost(1)
                .parallelism(1),
        )
        .unwrap()
    }

    async fn seeded_repos(hasher: &PasswordHasherService) -> (Repositories, User) {
        let repos = Repositories::in_memory();
        let user = User::new("acme", "customers", "alice")
            .with_password_hash(hasher.hash("s3cret").unwrap());
        repos.users.create(&user).await.unwrap();
        (repos, user)
    }

    fn credentials(username: &str, password: &str) -> HashMap<String, String> {
        let mut context = HashMap::new();
        context.insert(keys::USERNAME.to_string(), username.to_string());
        context.insert(keys::PASSWORD.to_string(), password.to_string());
        context
    }

    #[tokio::test]
    async fn correct_password_emits_success_with_principal() {
        let hasher = fast_hasher();
        let (repos, user) = seeded_repos(&hasher).await;
        let handler = ValidateUsernamePasswordHandler::new(hasher);

        let node = GraphNode::new("validate", "validateUsernamePassword");
        let context = credentials("alice", "s3cret");
        let inputs = BTreeMap::new();
        let step = StepContext {
            node: &node,
            context: &context,
            inputs: &inputs,
        };

        let outcome = handler.run(&step, &repos).await.unwrap();
        match outcome {
            NodeOutcome::Condition { label, updates } => {
                assert_eq!(label, labels::SUCCESS);
                assert_eq!(updates[keys::USER_ID], user.id.to_string());
                assert_eq!(updates[keys::USERNAME], "alice");
                assert_eq!(updates[keys::AUTH_LEVEL], "1");
            }
            other => panic!("expected success condition, got {other:?}"),
        }

        let stored = repos.users.get_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn wrong_password_emits_fail_and_counts() {
        let hasher = fast_hasher();
        let (repos, user) = seeded_repos(&hasher).await;
        let handler = ValidateUsernamePasswordHandler::new(hasher);

        let node = GraphNode::new("validate", "validateUsernamePassword");
        let context = credentials("alice", "wrong");
        let inputs = BTreeMap::new();
        let step = StepContext {
            node: &node,
            context: &context,
            inputs: &inputs,
        };

        let outcome = handler.run(&step, &repos).await.unwrap();
        assert_eq!(outcome, NodeOutcome::condition(labels::FAIL));

        let stored = repos.users.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 1);
        assert!(!stored.password_locked);
    }

    #[tokio::test]
    async fn lockout_threshold_emits_locked() {
        let hasher = fast_hasher();
        let (repos, user) = seeded_repos(&hasher).await;
        let handler = ValidateUsernamePasswordHandler::new(hasher);

        let node = GraphNode::new("validate", "validateUsernamePassword")
            .config("max_failed_password_attempts", "2");
        let context = credentials("alice", "wrong");
        let inputs = BTreeMap::new();
        let step = StepContext {
            node: &node,
            context: &context,
            inputs: &inputs,
        };

        assert_eq!(
            handler.run(&step, &repos).await.unwrap(),
            NodeOutcome::condition(labels::FAIL)
        );
        assert_eq!(
            handler.run(&step, &repos).await.unwrap(),
            NodeOutcome::condition(labels::LOCKED)
        );

        // Even the right password is rejected once locked.
        let context = credentials("alice", "s3cret");
        let step = StepContext {
            node: &node,
            context: &context,
            inputs: &inputs,
        };
        assert_eq!(
            handler.run(&step, &repos).await.unwrap(),
            NodeOutcome::condition(labels::LOCKED)
        );

        let stored = repos.users.get_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.password_locked);
    }

    #[tokio::test]
    async fn unknown_user_emits_fail() {
        let hasher = fast_hasher();
        let repos = Repositories::in_memory();
        let handler = ValidateUsernamePasswordHandler::new(hasher);

        let node = GraphNode::new("validate", "validateUsernamePassword");
        let context = credentials("nobody", "whatever");
        let inputs = BTreeMap::new();
        let step = StepContext {
            node: &node,
            context: &context,
            inputs: &inputs,
        };

        assert_eq!(
            handler.run(&step, &repos).await.unwrap(),
            NodeOutcome::condition(labels::FAIL)
        );
    }

    #[tokio::test]
    async fn user_without_password_emits_no_password() {
        let hasher = fast_hasher();
        let repos = Repositories::in_memory();
        repos
            .users
            .create(&User::new("acme", "customers", "alice"))
            .await
            .unwrap();
        let handler = ValidateUsernamePasswordHandler::new(hasher);

        let node = GraphNode::new("validate", "validateUsernamePassword");
        let context = credentials("alice", "anything");
        let inputs = BTreeMap::new();
        let step = StepContext {
            node: &node,
            context: &context,
            inputs: &inputs,
        };

        assert_eq!(
            handler.run(&step, &repos).await.unwrap(),
            NodeOutcome::condition(labels::NO_PASSWORD)
        );
    }

    #[tokio::test]
    async fn bad_lockout_config_is_fatal() {
        let hasher = fast_hasher();
        let (repos, _user) = seeded_repos(&hasher).await;
        let handler = ValidateUsernamePasswordHandler::new(hasher);

        let node = GraphNode::new("validate", "validateUsernamePassword")
            .config("max_failed_password_attempts", "lots");
        let context = credentials("alice", "s3cret");
        let inputs = BTreeMap::new();
        let step = StepContext {
            node: &node,
            context: &context,
            inputs: &inputs,
        };

        assert!(matches!(
            handler.run(&step, &repos).await,
            Err(EngineError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn update_password_prompts_then_stores_hash() {
        let hasher = fast_hasher();
        let (repos, user) = seeded_repos(&hasher).await;
        let handler = UpdatePasswordHandler::new(fast_hasher());

        let node = GraphNode::new("update", "updatePassword");
        let mut context = HashMap::new();
        context.insert(keys::USER_ID.to_string(), user.id.to_string());

        let inputs = BTreeMap::new();
        let step = StepContext {
            node: &node,
            context: &context,
            inputs: &inputs,
        };
        assert!(handler.run(&step, &repos).await.unwrap().is_prompt());

        let mut inputs = BTreeMap::new();
        inputs.insert(keys::PASSWORD.to_string(), "n3w-secret".to_string());
        let step = StepContext {
            node: &node,
            context: &context,
            inputs: &inputs,
        };
        assert_eq!(
            handler.run(&step, &repos).await.unwrap(),
            NodeOutcome::condition(labels::SUCCESS)
        );

        let stored = repos.users.get_by_id(user.id).await.unwrap().unwrap();
        let hash = stored.password_hash.unwrap();
        assert!(hasher.verify("n3w-secret", &hash).unwrap());
    }
}
