//! Flow definition validation.
//!
//! Structural validation runs eagerly when an [`Engine`] is constructed,
//! so malformed edges are rejected at load time instead of surfacing as
//! traversal failures in production. Registry-aware validation is a
//! stricter opt-in check for hosts that load flows and registry together;
//! `use` resolution nevertheless remains a fatal execution-time error, so
//! a mismatched deploy fails loudly either way.
//!
//! [`Engine`]: crate::engine::Engine

use iam_model::{FlowDefinition, NodeType};

use crate::error::{EngineError, EngineResult};
use crate::registry::NodeRegistry;

/// Checks the structural integrity of a flow definition.
///
/// Verifies that the start node exists, that node map keys agree with
/// node names, and that every transition target references an existing
/// node.
///
/// ## Errors
///
/// Returns [`EngineError::InvalidFlow`] describing the first violation.
pub fn validate_flow(flow: &FlowDefinition) -> EngineResult<()> {
    if flow.name.is_empty() {
        return Err(invalid("flow name is empty"));
    }
    if flow.start.is_empty() {
        return Err(invalid("flow start node is not defined"));
    }
    if !flow.nodes.contains_key(&flow.start) {
        return Err(EngineError::InvalidFlow(format!(
            "start node '{}' not found in nodes",
            flow.start
        )));
    }

    for (key, node) in &flow.nodes {
        if node.name != *key {
            return Err(EngineError::InvalidFlow(format!(
                "node keyed '{key}' declares name '{}'",
                node.name
            )));
        }
        if node.use_id.is_empty() {
            return Err(EngineError::InvalidFlow(format!(
                "node '{key}' has no 'use' identifier"
            )));
        }
        for (condition, target) in &node.next {
            if !flow.nodes.contains_key(target) {
                return Err(EngineError::InvalidFlow(format!(
                    "node '{key}' routes condition '{condition}' to undefined node '{target}'"
                )));
            }
        }
    }

    Ok(())
}

/// Checks a flow against a populated registry.
///
/// On top of [`validate_flow`]: every `use` identifier must resolve,
/// every edge label must be a condition its node may emit, and every
/// non-Result node must have at least one outgoing edge.
///
/// ## Errors
///
/// Returns [`EngineError::UnknownDefinition`] or
/// [`EngineError::InvalidFlow`] describing the first violation.
pub fn validate_flow_with_registry(
    flow: &FlowDefinition,
    registry: &NodeRegistry,
) -> EngineResult<()> {
    validate_flow(flow)?;

    for (key, node) in &flow.nodes {
        let Some(def) = registry.lookup(&node.use_id) else {
            return Err(EngineError::UnknownDefinition(node.use_id.clone()));
        };

        if def.node_type != NodeType::Result && node.next.is_empty() {
            return Err(EngineError::InvalidFlow(format!(
                "node '{key}' has no outgoing edges but is not terminal"
            )));
        }

        for condition in node.next.keys() {
            if !def.emits(condition) {
                return Err(EngineError::InvalidFlow(format!(
                    "node '{key}' routes condition '{condition}' which '{}' never emits",
                    node.use_id
                )));
            }
        }
    }

    Ok(())
}

fn invalid(message: &str) -> EngineError {
    EngineError::InvalidFlow(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_model::GraphNode;

    fn valid_flow() -> FlowDefinition {
        FlowDefinition::new("login", "init")
            .node(GraphNode::new("init", "init").edge("start", "done"))
            .node(GraphNode::new("done", "successResult"))
    }

    #[test]
    fn accepts_well_formed_flow() {
        assert!(validate_flow(&valid_flow()).is_ok());
    }

    #[test]
    fn rejects_missing_start_node() {
        let flow = FlowDefinition::new("login", "missing")
            .node(GraphNode::new("init", "init"));
        let err = validate_flow(&flow).unwrap_err();
        assert!(err.to_string().contains("start node 'missing'"));
    }

    #[test]
    fn rejects_dangling_edge() {
        let flow = FlowDefinition::new("login", "init")
            .node(GraphNode::new("init", "init").edge("start", "nowhere"));
        let err = validate_flow(&flow).unwrap_err();
        assert!(err.to_string().contains("undefined node 'nowhere'"));
    }

    #[test]
    fn rejects_name_key_mismatch() {
        let mut flow = FlowDefinition::new("login", "init");
        flow.nodes
            .insert("init".to_string(), GraphNode::new("other", "init"));
        assert!(validate_flow(&flow).is_err());
    }

    #[test]
    fn registry_validation_rejects_unknown_use() {
        let registry = NodeRegistry::builtin();
        let flow = FlowDefinition::new("login", "init")
            .node(GraphNode::new("init", "noSuchNodeType").edge("start", "done"))
            .node(GraphNode::new("done", "successResult"));

        let err = validate_flow_with_registry(&flow, &registry).unwrap_err();
        assert!(matches!(err, EngineError::UnknownDefinition(_)));
    }

    #[test]
    fn registry_validation_rejects_unemittable_label() {
        let registry = NodeRegistry::builtin();
        let flow = FlowDefinition::new("login", "init")
            .node(GraphNode::new("init", "init").edge("nonsense", "done"))
            .node(GraphNode::new("done", "successResult"));

        let err = validate_flow_with_registry(&flow, &registry).unwrap_err();
        assert!(err.to_string().contains("never emits"));
    }

    #[test]
    fn registry_validation_requires_outgoing_edges() {
        let registry = NodeRegistry::builtin();
        let flow = FlowDefinition::new("login", "init")
            .node(GraphNode::new("init", "init"));

        let err = validate_flow_with_registry(&flow, &registry).unwrap_err();
        assert!(err.to_string().contains("no outgoing edges"));
    }

    #[test]
    fn registry_validation_accepts_valid_flow() {
        let registry = NodeRegistry::builtin();
        assert!(validate_flow_with_registry(&valid_flow(), &registry).is_ok());
    }
}
