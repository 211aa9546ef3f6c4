//! Engine error types.
//!
//! Two error tiers, never conflated: recoverable flow outcomes (wrong
//! credentials, username taken) travel through the graph as condition
//! labels toward Failure result nodes and are *not* errors here.
//! [`EngineError`] is reserved for fatal conditions (a broken flow,
//! registry mismatch or failing collaborator) which abort the current
//! step and must not be retried automatically.

use iam_storage::StorageError;
use thiserror::Error;

/// Fatal errors raised by the flow engine and node handlers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session's current node does not exist in the flow.
    #[error("node '{0}' not found in flow")]
    UnknownNode(String),

    /// A node's `use` identifier is not present in the registry.
    ///
    /// Indicates a flow/registry mismatch deployed to production; never
    /// recoverable.
    #[error("node definition for '{0}' not found")]
    UnknownDefinition(String),

    /// A `use` identifier was registered twice.
    #[error("node definition '{0}' is already registered")]
    DuplicateDefinition(String),

    /// The flow definition failed structural validation.
    #[error("invalid flow definition: {0}")]
    InvalidFlow(String),

    /// A handler emitted a condition label it never declared.
    #[error("node '{node}' emitted undeclared condition '{condition}'")]
    UndeclaredCondition {
        /// The offending node.
        node: String,
        /// The undeclared label.
        condition: String,
    },

    /// The graph has no edge for an emitted condition label.
    #[error("no next node defined for condition '{condition}' of node '{node}'")]
    UndefinedTransition {
        /// The node whose `next` map is missing the edge.
        node: String,
        /// The label without a target.
        condition: String,
    },

    /// A handler produced an outcome its node type does not permit.
    #[error("node '{node}' produced an invalid outcome: {message}")]
    InvalidOutcome {
        /// The offending node.
        node: String,
        /// What went wrong.
        message: String,
    },

    /// A node's custom configuration is missing or malformed.
    #[error("node '{node}' configuration error: {message}")]
    Config {
        /// The misconfigured node.
        node: String,
        /// What is missing or malformed.
        message: String,
    },

    /// A node handler failed internally.
    #[error("node handler failure: {0}")]
    Handler(String),

    /// A cryptographic operation failed.
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// A repository collaborator failed.
    #[error("repository failure: {0}")]
    Repository(#[from] StorageError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
