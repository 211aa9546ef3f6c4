//! Node definition registry.
//!
//! A process-wide, read-mostly table mapping a node-type identifier (the
//! `use` value in flow definitions) to its capability descriptor and
//! handler. Populated once at startup and treated as read-only during
//! request processing.

use std::sync::Arc;

use dashmap::DashMap;
use iam_model::session::PromptSet;
use iam_model::{NodeType, PromptKind, TerminalKind};

use crate::error::{EngineError, EngineResult};
use crate::handler::NodeHandler;

/// Capability descriptor for one node type.
///
/// Declares everything the engine and flow tooling need to know about a
/// node type without running it: which prompts it may request, which
/// condition labels it may emit, which custom-config keys it recognizes,
/// and, for Result nodes, its success or failure semantics.
#[derive(Clone)]
pub struct NodeDefinition {
    /// Identifier referenced by `GraphNode::use_id`.
    pub use_id: &'static str,
    /// Human-readable name for editors.
    pub pretty_name: &'static str,
    /// Description of what the node does.
    pub description: &'static str,
    /// Grouping category for editors.
    pub category: &'static str,
    /// Node classification.
    pub node_type: NodeType,
    /// Context keys the node expects to be present when it runs.
    pub required_context: Vec<&'static str>,
    /// Context keys the node may contribute.
    pub output_context: Vec<&'static str>,
    /// Prompt keys the node may request, with rendering hints.
    pub prompts: PromptSet,
    /// Condition labels the node may emit.
    pub conditions: Vec<&'static str>,
    /// Recognized custom-config keys with descriptions.
    pub custom_config: Vec<(&'static str, &'static str)>,
    /// Success or failure semantics; present for Result nodes only.
    pub terminal: Option<TerminalKind>,
    /// Handler implementing the node type. Query nodes without logic may
    /// omit it; the engine's generic prompt/consume behavior applies.
    pub handler: Option<Arc<dyn NodeHandler>>,
}

impl NodeDefinition {
    /// Creates a definition with the given identifier and type.
    #[must_use]
    pub fn new(use_id: &'static str, node_type: NodeType) -> Self {
        Self {
            use_id,
            pretty_name: "",
            description: "",
            category: "",
            node_type,
            required_context: Vec::new(),
            output_context: Vec::new(),
            prompts: PromptSet::new(),
            conditions: Vec::new(),
            custom_config: Vec::new(),
            terminal: None,
            handler: None,
        }
    }

    /// Sets editor metadata.
    #[must_use]
    pub const fn describe(
        mut self,
        pretty_name: &'static str,
        description: &'static str,
        category: &'static str,
    ) -> Self {
        self.pretty_name = pretty_name;
        self.description = description;
        self.category = category;
        self
    }

    /// Declares required context keys.
    #[must_use]
    pub fn requires(mut self, keys: &[&'static str]) -> Self {
        self.required_context = keys.to_vec();
        self
    }

    /// Declares contributed context keys.
    #[must_use]
    pub fn outputs(mut self, keys: &[&'static str]) -> Self {
        self.output_context = keys.to_vec();
        self
    }

    /// Declares a prompt key with its rendering hint.
    #[must_use]
    pub fn prompt(mut self, key: &'static str, kind: PromptKind) -> Self {
        self.prompts.insert(key.to_string(), kind);
        self
    }

    /// Declares the condition labels the node may emit.
    #[must_use]
    pub fn conditions(mut self, labels: &[&'static str]) -> Self {
        self.conditions = labels.to_vec();
        self
    }

    /// Declares a recognized custom-config key.
    #[must_use]
    pub fn config_option(mut self, key: &'static str, description: &'static str) -> Self {
        self.custom_config.push((key, description));
        self
    }

    /// Marks this definition terminal with the given semantics.
    #[must_use]
    pub const fn terminal(mut self, kind: TerminalKind) -> Self {
        self.terminal = Some(kind);
        self
    }

    /// Attaches the handler.
    #[must_use]
    pub fn handler(mut self, handler: impl NodeHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Whether the definition declares the given condition label.
    #[must_use]
    pub fn emits(&self, label: &str) -> bool {
        self.conditions.iter().any(|c| *c == label)
    }
}

impl std::fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("use_id", &self.use_id)
            .field("node_type", &self.node_type)
            .field("prompts", &self.prompts)
            .field("conditions", &self.conditions)
            .field("terminal", &self.terminal)
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

/// Registry of node definitions, keyed by `use` identifier.
///
/// Registration happens at process startup; lookups during request
/// processing are lock-free reads. A missing identifier at execution
/// time is a fatal engine error, not a recoverable one.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    definitions: DashMap<String, Arc<NodeDefinition>>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in node library.
    #[must_use]
    pub fn builtin() -> Self {
        let registry = Self::new();
        for def in crate::nodes::builtin_definitions() {
            registry
                .definitions
                .insert(def.use_id.to_string(), Arc::new(def));
        }
        registry
    }

    /// Registers a definition.
    ///
    /// ## Errors
    ///
    /// Returns [`EngineError::DuplicateDefinition`] if the identifier is
    /// already taken; exactly one handler per `use` value.
    pub fn register(&self, definition: NodeDefinition) -> EngineResult<()> {
        let use_id = definition.use_id.to_string();
        match self.definitions.entry(use_id.clone()) {
            dashmap::Entry::Occupied(_) => Err(EngineError::DuplicateDefinition(use_id)),
            dashmap::Entry::Vacant(entry) => {
                entry.insert(Arc::new(definition));
                Ok(())
            }
        }
    }

    /// Looks up a definition by `use` identifier.
    #[must_use]
    pub fn lookup(&self, use_id: &str) -> Option<Arc<NodeDefinition>> {
        self.definitions
            .get(use_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Whether a definition is registered.
    #[must_use]
    pub fn contains(&self, use_id: &str) -> bool {
        self.definitions.contains_key(use_id)
    }

    /// Registered identifiers, in no particular order.
    #[must_use]
    pub fn use_ids(&self) -> Vec<String> {
        self.definitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_core_nodes() {
        let registry = NodeRegistry::builtin();
        assert!(registry.contains("init"));
        assert!(registry.contains("successResult"));
        assert!(registry.contains("failureResult"));
        assert!(registry.contains("askUsername"));
        assert!(registry.lookup("doesNotExist").is_none());
    }

    #[test]
    fn duplicate_registration_rejected() {
        let registry = NodeRegistry::new();
        registry
            .register(NodeDefinition::new("custom", NodeType::Logic))
            .unwrap();

        let result = registry.register(NodeDefinition::new("custom", NodeType::Logic));
        assert!(matches!(result, Err(EngineError::DuplicateDefinition(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn definition_declares_capabilities() {
        let def = NodeDefinition::new("askUsername", NodeType::Query)
            .prompt("username", PromptKind::Text)
            .conditions(&["submitted"])
            .outputs(&["username"]);

        assert!(def.emits("submitted"));
        assert!(!def.emits("success"));
        assert_eq!(def.prompts.get("username"), Some(&PromptKind::Text));
    }

    #[test]
    fn terminal_definition_carries_semantics() {
        let def = NodeDefinition::new("successResult", NodeType::Result)
            .terminal(TerminalKind::Success);
        assert_eq!(def.terminal, Some(TerminalKind::Success));
    }
}
