//! Username node types.

use async_trait::async_trait;
use iam_model::{NodeType, PromptKind};
use iam_storage::Repositories;

use crate::error::EngineResult;
use crate::handler::{NodeHandler, NodeOutcome, StepContext};
use crate::nodes::{keys, labels};
use crate::registry::NodeDefinition;

/// Definition for the `askUsername` node type.
///
/// A pure query node: the engine's generic prompt/consume behavior
/// collects the username into the context, no handler needed.
#[must_use]
pub fn ask_username_definition() -> NodeDefinition {
    NodeDefinition::new("askUsername", NodeType::Query)
        .describe("Ask Username", "Prompts the user for a username", "Username")
        .prompt(keys::USERNAME, PromptKind::Text)
        .outputs(&[keys::USERNAME])
        .conditions(&[labels::SUBMITTED])
}

/// Checks whether the username in the context is still free.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckUsernameAvailableHandler;

#[async_trait]
impl NodeHandler for CheckUsernameAvailableHandler {
    async fn run(&self, step: &StepContext<'_>, repos: &Repositories) -> EngineResult<NodeOutcome> {
        let username = step.context_value(keys::USERNAME).unwrap_or_default();
        let existing = repos.users.get_by_username(username).await?;

        Ok(NodeOutcome::condition(if existing.is_some() {
            labels::TAKEN
        } else {
            labels::AVAILABLE
        }))
    }
}

/// Definition for the `checkUsernameAvailable` node type.
#[must_use]
pub fn check_username_available_definition() -> NodeDefinition {
    NodeDefinition::new("checkUsernameAvailable", NodeType::Logic)
        .describe(
            "Check Username Available",
            "Branches on whether the username is already registered",
            "Username",
        )
        .requires(&[keys::USERNAME])
        .conditions(&[labels::AVAILABLE, labels::TAKEN])
        .handler(CheckUsernameAvailableHandler)
}
