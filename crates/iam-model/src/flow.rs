//! Declarative flow graph model.
//!
//! A flow is a named graph of nodes and labeled transitions describing a
//! multi-step authentication, registration or authorization process. The
//! engine treats a [`FlowDefinition`] as already parsed; loading it from
//! YAML or a database is the host's concern.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Classification of a node within a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    /// Auto-advancing entry point; always emits a condition.
    Init,
    /// Collects user input through prompts; no side effects of its own.
    Query,
    /// Performs logic and side effects; always emits a condition.
    Logic,
    /// May either request input or emit a condition, depending on state.
    QueryWithLogic,
    /// Terminal node; ends the run with success or failure semantics.
    Result,
}

/// Success or failure semantics carried by a Result node.
///
/// Protocol collaborators must inspect this classification rather than the
/// presence of a flow result: failure nodes also populate a result object
/// for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalKind {
    /// The flow ended with an authenticated principal.
    Success,
    /// The flow ended without authentication (wrong credentials, abort).
    Failure,
}

/// Rendering hint for a prompt key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Free text input.
    Text,
    /// Masked password input.
    Password,
    /// Email address input.
    Email,
    /// Numeric input (e.g. an OTP code).
    Number,
    /// Yes/no confirmation.
    Boolean,
    /// Value round-tripped without rendering (e.g. a device challenge).
    Hidden,
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hint = match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Email => "email",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Hidden => "hidden",
        };
        f.write_str(hint)
    }
}

/// A single step in a flow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node name, unique within the flow.
    pub name: String,
    /// Node-type identifier, resolved against the node definition registry.
    #[serde(rename = "use")]
    pub use_id: String,
    /// Outgoing edges: condition label to target node name.
    #[serde(default)]
    pub next: HashMap<String, String>,
    /// Configuration consumed by the node handler, opaque to the engine.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_config: HashMap<String, String>,
}

impl GraphNode {
    /// Creates a node with no edges and no configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, use_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            use_id: use_id.into(),
            next: HashMap::new(),
            custom_config: HashMap::new(),
        }
    }

    /// Adds an outgoing edge.
    #[must_use]
    pub fn edge(mut self, condition: impl Into<String>, target: impl Into<String>) -> Self {
        self.next.insert(condition.into(), target.into());
        self
    }

    /// Adds a custom configuration entry.
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_config.insert(key.into(), value.into());
        self
    }

    /// Gets a custom configuration value.
    #[must_use]
    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.custom_config.get(key).map(String::as_str)
    }
}

/// A named, declarative flow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// Flow name, unique within a realm.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Name of the entry node.
    pub start: String,
    /// Nodes of the graph, keyed by node name.
    pub nodes: HashMap<String, GraphNode>,
}

impl FlowDefinition {
    /// Creates an empty flow with the given name and start node.
    #[must_use]
    pub fn new(name: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            start: start.into(),
            nodes: HashMap::new(),
        }
    }

    /// Adds a node to the flow, keyed by its name.
    #[must_use]
    pub fn node(mut self, node: GraphNode) -> Self {
        self.nodes.insert(node.name.clone(), node);
        self
    }

    /// Looks up a node by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }
}
