//! Authentication session model.
//!
//! The session is the serializable, resumable record of one flow run.
//! There are no in-process coroutines: the engine suspends by returning
//! control to the caller with pending prompts, and resumes later from a
//! freshly deserialized session. The `(flow_id, current, context,
//! history)` tuple is the sole resumption key; no hidden engine-side
//! state exists outside this record.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow::{PromptKind, TerminalKind};

/// Pending prompts, keyed by input name with a rendering hint.
///
/// Kept ordered so that re-prompts and renderings are deterministic.
pub type PromptSet = BTreeMap<String, PromptKind>;

/// One entry of the append-only transition log.
///
/// Records the node, the condition taken and, for input-bearing
/// transitions, a canonical encoding of the inputs consumed: enough to
/// replay or audit a run deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The node this record belongs to.
    pub node: String,
    /// The condition label taken, absent for prompt and terminal records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Canonical JSON of the inputs consumed by this transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<String>,
}

impl TransitionRecord {
    /// Record for a node reached without a condition (prompt or terminal).
    #[must_use]
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            node: name.into(),
            condition: None,
            inputs: None,
        }
    }

    /// Record for a condition transition without consumed inputs.
    #[must_use]
    pub fn condition(name: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            node: name.into(),
            condition: Some(condition.into()),
            inputs: None,
        }
    }

    /// Record for a condition transition that consumed user inputs.
    ///
    /// The inputs are encoded as key-sorted JSON so that identical
    /// submissions always produce identical records.
    #[must_use]
    pub fn submission(
        name: impl Into<String>,
        condition: impl Into<String>,
        inputs: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            node: name.into(),
            condition: Some(condition.into()),
            inputs: serde_json::to_string(inputs).ok(),
        }
    }
}

impl std::fmt::Display for TransitionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.node)?;
        if let Some(condition) = &self.condition {
            write!(f, ":{condition}")?;
        }
        if let Some(inputs) = &self.inputs {
            write!(f, ":{inputs}")?;
        }
        Ok(())
    }
}

/// How strongly the principal was authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum AuthLevel {
    /// No authentication took place.
    #[default]
    #[serde(rename = "0")]
    Unauthenticated,
    /// One factor verified (e.g. password).
    #[serde(rename = "1")]
    OneFactor,
    /// Two factors verified (e.g. password + OTP).
    #[serde(rename = "2")]
    TwoFactor,
}

/// Outcome payload produced by a terminal node.
///
/// Failure nodes populate this as well (for rendering); success is
/// decided by the terminal node's [`TerminalKind`], never by the mere
/// presence of a result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlowResult {
    /// Identifier of the authenticated principal, empty on failure.
    pub user_id: String,
    /// Display name of the principal, empty on failure.
    pub username: String,
    /// Whether the run authenticated a principal.
    pub authenticated: bool,
    /// Authentication strength achieved.
    pub auth_level: AuthLevel,
}

/// The serializable state of one flow run.
///
/// Created on the first request for a flow and route, mutated once per
/// HTTP request by exactly one engine invocation, and deleted once a
/// terminal node is reached and the protocol handoff completes, or
/// reclaimed by the host via TTL if abandoned. The engine provides no
/// transactional guarantee across overlapping requests for the same
/// session; that is the session store's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationSession {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// Name of the flow being executed.
    pub flow_id: String,
    /// Name of the active node.
    pub current: String,
    /// Accumulated key/value pairs contributed by nodes; never cleared
    /// mid-run.
    pub context: HashMap<String, String>,
    /// Append-only transition log.
    pub history: Vec<TransitionRecord>,
    /// Prompts awaiting user input, present while suspended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptSet>,
    /// Last fatal engine error, cleared at the start of each step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Terminal result payload, present once a Result node ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<FlowResult>,
    /// Semantics of the terminal node reached, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TerminalKind>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the host should consider the session abandoned.
    pub expires_at: DateTime<Utc>,
}

impl AuthenticationSession {
    /// Creates a fresh session positioned at the flow's start node.
    #[must_use]
    pub fn new(flow_id: impl Into<String>, start: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::now_v7(),
            flow_id: flow_id.into(),
            current: start.into(),
            context: HashMap::new(),
            history: Vec::new(),
            prompts: None,
            error: None,
            result: None,
            outcome: None,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Gets a context value.
    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// Renders the history as compact `node[:condition[:inputs]]` labels.
    #[must_use]
    pub fn history_labels(&self) -> Vec<String> {
        self.history.iter().map(ToString::to_string).collect()
    }

    /// The most recent history label, empty for a fresh session.
    #[must_use]
    pub fn latest_history(&self) -> String {
        self.history.last().map(ToString::to_string).unwrap_or_default()
    }

    /// Whether the run reached a terminal node.
    #[must_use]
    pub const fn finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether the run ended on a Success terminal with a named principal.
    ///
    /// A populated result alone is not enough: failure terminals also
    /// carry a result object for rendering.
    #[must_use]
    pub fn did_authenticate(&self) -> bool {
        matches!(self.outcome, Some(TerminalKind::Success))
            && self.result.as_ref().is_some_and(|r| !r.user_id.is_empty())
    }

    /// Whether the run ended on a Failure terminal.
    #[must_use]
    pub fn did_fail(&self) -> bool {
        matches!(self.outcome, Some(TerminalKind::Failure))
    }

    /// Session age in seconds.
    #[must_use]
    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.created_at).num_seconds()
    }

    /// Whether the host should reclaim this session.
    ///
    /// Expiry is bookkeeping only; the engine never reclaims sessions
    /// itself.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
