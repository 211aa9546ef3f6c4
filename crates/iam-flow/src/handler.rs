//! Node handler contract.
//!
//! Handlers are pluggable components that implement one node type each.
//! A handler is a function of (context snapshot, filtered inputs, custom
//! config, repository collaborators) to exactly one outcome; all session
//! mutation is centralized in the engine's transition step, which keeps
//! replay and auditing tractable.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use iam_model::session::{FlowResult, PromptSet};
use iam_model::{GraphNode, PromptKind};
use iam_storage::Repositories;

use crate::error::EngineResult;

/// The read-only view a handler receives for one step.
#[derive(Debug)]
pub struct StepContext<'a> {
    /// The graph node being executed, including its custom config.
    pub node: &'a GraphNode,
    /// Snapshot of the accumulated flow context.
    pub context: &'a HashMap<String, String>,
    /// Caller inputs for this step, already filtered to the keys the
    /// node's definition declares; unknown keys are discarded before the
    /// handler sees them.
    pub inputs: &'a BTreeMap<String, String>,
}

impl StepContext<'_> {
    /// Gets a filtered input value.
    #[must_use]
    pub fn input(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).map(String::as_str)
    }

    /// Gets a context value.
    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// Gets a custom configuration value from the graph node.
    #[must_use]
    pub fn config(&self, key: &str) -> Option<&str> {
        self.node.config_value(key)
    }
}

/// The single outcome a handler produces for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// The node needs input keys not yet satisfied; the engine halts and
    /// surfaces the declared keys without advancing.
    Prompt(PromptSet),
    /// A condition label selecting the outgoing edge, plus any new
    /// context entries the node contributes.
    Condition {
        /// The emitted condition label.
        label: String,
        /// Context entries to merge; existing keys are overwritten,
        /// nothing is ever removed.
        updates: HashMap<String, String>,
    },
    /// Terminal payload; only Result nodes may produce this.
    Terminal(FlowResult),
}

impl NodeOutcome {
    /// Creates a prompt outcome from `(key, kind)` pairs.
    #[must_use]
    pub fn prompt<K: Into<String>>(prompts: impl IntoIterator<Item = (K, PromptKind)>) -> Self {
        Self::Prompt(
            prompts
                .into_iter()
                .map(|(key, kind)| (key.into(), kind))
                .collect(),
        )
    }

    /// Creates a condition outcome with no context updates.
    #[must_use]
    pub fn condition(label: impl Into<String>) -> Self {
        Self::Condition {
            label: label.into(),
            updates: HashMap::new(),
        }
    }

    /// Creates a condition outcome carrying context updates.
    #[must_use]
    pub fn condition_with(
        label: impl Into<String>,
        updates: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self::Condition {
            label: label.into(),
            updates: updates.into_iter().collect(),
        }
    }

    /// Creates a terminal outcome.
    #[must_use]
    pub const fn terminal(result: FlowResult) -> Self {
        Self::Terminal(result)
    }

    /// Whether this outcome is a prompt request.
    #[must_use]
    pub const fn is_prompt(&self) -> bool {
        matches!(self, Self::Prompt(_))
    }

    /// Whether this outcome selects an outgoing edge.
    #[must_use]
    pub const fn is_condition(&self) -> bool {
        matches!(self, Self::Condition { .. })
    }
}

/// A node-type implementation.
///
/// Handlers may have side effects (repository reads and writes, password
/// hashing, counters) and must be written defensively against
/// re-invocation with identical inputs: a resubmitted step re-invokes the
/// same handler with the same stored inputs, and the engine provides no
/// cross-request locking.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Executes one step of this node type.
    ///
    /// ## Errors
    ///
    /// Only fatal failures (unavailable collaborators, broken
    /// configuration) are errors. Recoverable outcomes such as wrong
    /// credentials are condition labels.
    async fn run(&self, step: &StepContext<'_>, repos: &Repositories) -> EngineResult<NodeOutcome>;
}
