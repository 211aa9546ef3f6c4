//! System node types: flow entry, terminal results, variable assignment.

use async_trait::async_trait;
use iam_model::session::{AuthLevel, FlowResult};
use iam_model::{NodeType, TerminalKind};
use iam_storage::Repositories;

use crate::error::{EngineError, EngineResult};
use crate::handler::{NodeHandler, NodeOutcome, StepContext};
use crate::nodes::{keys, labels};
use crate::registry::NodeDefinition;

/// Entry point of every flow; advances immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitHandler;

#[async_trait]
impl NodeHandler for InitHandler {
    async fn run(&self, _step: &StepContext<'_>, _repos: &Repositories) -> EngineResult<NodeOutcome> {
        Ok(NodeOutcome::condition(labels::START))
    }
}

/// Definition for the `init` node type.
#[must_use]
pub fn init_definition() -> NodeDefinition {
    NodeDefinition::new("init", NodeType::Init)
        .describe("Init", "Entry point of every flow", "System")
        .conditions(&[labels::START])
        .handler(InitHandler)
}

/// Terminal node marking the run authenticated.
///
/// Reads the principal from the accumulated context; authenticating
/// nodes are expected to have populated `user_id`, `username` and
/// `auth_level` by the time the flow reaches this node.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessResultHandler;

#[async_trait]
impl NodeHandler for SuccessResultHandler {
    async fn run(&self, step: &StepContext<'_>, _repos: &Repositories) -> EngineResult<NodeOutcome> {
        let auth_level = match step.context_value(keys::AUTH_LEVEL) {
            Some("0") => AuthLevel::Unauthenticated,
            Some("2") => AuthLevel::TwoFactor,
            _ => AuthLevel::OneFactor,
        };
        Ok(NodeOutcome::terminal(FlowResult {
            user_id: step.context_value(keys::USER_ID).unwrap_or_default().to_string(),
            username: step.context_value(keys::USERNAME).unwrap_or_default().to_string(),
            authenticated: true,
            auth_level,
        }))
    }
}

/// Definition for the `successResult` node type.
#[must_use]
pub fn success_result_definition() -> NodeDefinition {
    NodeDefinition::new("successResult", NodeType::Result)
        .describe("Authentication Success", "Ends the flow as authenticated", "System")
        .requires(&[keys::USER_ID, keys::USERNAME])
        .terminal(TerminalKind::Success)
        .handler(SuccessResultHandler)
}

/// Terminal node marking the run failed.
///
/// Populates a result object so the host can render the failure; the
/// terminal kind, not the result's presence, is what protocol
/// collaborators classify on.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureResultHandler;

#[async_trait]
impl NodeHandler for FailureResultHandler {
    async fn run(&self, _step: &StepContext<'_>, _repos: &Repositories) -> EngineResult<NodeOutcome> {
        Ok(NodeOutcome::terminal(FlowResult {
            user_id: String::new(),
            username: String::new(),
            authenticated: false,
            auth_level: AuthLevel::Unauthenticated,
        }))
    }
}

/// Definition for the `failureResult` node type.
#[must_use]
pub fn failure_result_definition() -> NodeDefinition {
    NodeDefinition::new("failureResult", NodeType::Result)
        .describe("Authentication Failure", "Ends the flow as failed", "System")
        .terminal(TerminalKind::Failure)
        .handler(FailureResultHandler)
}

/// Writes a configured key/value pair into the flow context.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetVariableHandler;

#[async_trait]
impl NodeHandler for SetVariableHandler {
    async fn run(&self, step: &StepContext<'_>, _repos: &Repositories) -> EngineResult<NodeOutcome> {
        let key = step.config("key").filter(|v| !v.is_empty()).ok_or_else(|| {
            EngineError::Config {
                node: step.node.name.clone(),
                message: "missing required config 'key'".to_string(),
            }
        })?;
        let value = step.config("value").filter(|v| !v.is_empty()).ok_or_else(|| {
            EngineError::Config {
                node: step.node.name.clone(),
                message: "missing required config 'value'".to_string(),
            }
        })?;

        Ok(NodeOutcome::condition_with(
            labels::DONE,
            [(key.to_string(), value.to_string())],
        ))
    }
}

/// Definition for the `setVariable` node type.
#[must_use]
pub fn set_variable_definition() -> NodeDefinition {
    NodeDefinition::new("setVariable", NodeType::Logic)
        .describe("Set Variable", "Writes a static value into the flow context", "System")
        .conditions(&[labels::DONE])
        .config_option("key", "Context key to set (required)")
        .config_option("value", "Value to assign (required)")
        .handler(SetVariableHandler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_model::GraphNode;
    use std::collections::{BTreeMap, HashMap};

    fn step<'a>(
        node: &'a GraphNode,
        context: &'a HashMap<String, String>,
        inputs: &'a BTreeMap<String, String>,
    ) -> StepContext<'a> {
        StepContext {
            node,
            context,
            inputs,
        }
    }

    #[tokio::test]
    async fn init_emits_start() {
        let node = GraphNode::new("init", "init");
        let context = HashMap::new();
        let inputs = BTreeMap::new();
        let repos = Repositories::in_memory();

        let outcome = InitHandler
            .run(&step(&node, &context, &inputs), &repos)
            .await
            .unwrap();
        assert_eq!(outcome, NodeOutcome::condition(labels::START));
    }

    #[tokio::test]
    async fn success_result_reads_principal_from_context() {
        let node = GraphNode::new("done", "successResult");
        let mut context = HashMap::new();
        context.insert(keys::USER_ID.to_string(), "u-1".to_string());
        context.insert(keys::USERNAME.to_string(), "alice".to_string());
        context.insert(keys::AUTH_LEVEL.to_string(), "2".to_string());
        let inputs = BTreeMap::new();
        let repos = Repositories::in_memory();

        let outcome = SuccessResultHandler
            .run(&step(&node, &context, &inputs), &repos)
            .await
            .unwrap();
        match outcome {
            NodeOutcome::Terminal(result) => {
                assert!(result.authenticated);
                assert_eq!(result.user_id, "u-1");
                assert_eq!(result.auth_level, AuthLevel::TwoFactor);
            }
            _ => panic!("expected terminal outcome"),
        }
    }

    #[tokio::test]
    async fn failure_result_populates_unauthenticated_payload() {
        let node = GraphNode::new("rejected", "failureResult");
        let context = HashMap::new();
        let inputs = BTreeMap::new();
        let repos = Repositories::in_memory();

        let outcome = FailureResultHandler
            .run(&step(&node, &context, &inputs), &repos)
            .await
            .unwrap();
        match outcome {
            NodeOutcome::Terminal(result) => {
                assert!(!result.authenticated);
                assert_eq!(result.auth_level, AuthLevel::Unauthenticated);
            }
            _ => panic!("expected terminal outcome"),
        }
    }

    #[tokio::test]
    async fn set_variable_requires_key_and_value() {
        let node = GraphNode::new("set", "setVariable").config("key", "locale");
        let context = HashMap::new();
        let inputs = BTreeMap::new();
        let repos = Repositories::in_memory();

        let result = SetVariableHandler
            .run(&step(&node, &context, &inputs), &repos)
            .await;
        assert!(matches!(result, Err(EngineError::Config { .. })));

        let node = node.config("value", "en");
        let outcome = SetVariableHandler
            .run(&step(&node, &context, &inputs), &repos)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            NodeOutcome::condition_with(
                labels::DONE,
                [("locale".to_string(), "en".to_string())]
            )
        );
    }
}
