//! Flow execution engine.
//!
//! The engine interprets a declarative flow definition one HTTP request
//! at a time: given a session and fresh user input it advances the state
//! machine until it must ask the user something or reaches a terminal
//! node. Suspension is continuation-via-serialization: the engine
//! returns control to the caller with pending prompts and resumes later
//! from the persisted session. Each invocation is synchronous and
//! sequential: collaborators are awaited in order, nothing is spawned,
//! and no engine-side state survives between calls.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Duration;
use iam_model::session::TransitionRecord;
use iam_model::{AuthenticationSession, FlowDefinition, GraphNode, NodeType};
use iam_storage::Repositories;

use crate::error::{EngineError, EngineResult};
use crate::handler::{NodeOutcome, StepContext};
use crate::nodes::labels;
use crate::registry::{NodeDefinition, NodeRegistry};
use crate::validation::validate_flow;

/// Default time-to-live for fresh sessions, in minutes.
///
/// Expiry is bookkeeping for the host's session store; the engine never
/// reclaims sessions itself.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

/// Executes one flow definition against resumable sessions.
#[derive(Debug)]
pub struct Engine {
    flow: FlowDefinition,
    registry: Arc<NodeRegistry>,
}

impl Engine {
    /// Constructs an engine, eagerly validating the flow's structure.
    ///
    /// ## Errors
    ///
    /// Returns [`EngineError::InvalidFlow`] if the start node or any
    /// transition target references an undefined node.
    pub fn new(flow: FlowDefinition, registry: Arc<NodeRegistry>) -> EngineResult<Self> {
        validate_flow(&flow)?;
        Ok(Self { flow, registry })
    }

    /// The flow this engine executes.
    #[must_use]
    pub const fn flow(&self) -> &FlowDefinition {
        &self.flow
    }

    /// Creates a fresh session positioned at the flow's start node.
    #[must_use]
    pub fn init_session(&self) -> AuthenticationSession {
        AuthenticationSession::new(
            &self.flow.name,
            &self.flow.start,
            Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
        )
    }

    /// Advances the session by one step.
    ///
    /// Loops internally across auto-resolving nodes and returns on
    /// exactly one of: a pending prompt (suspension), a terminal result,
    /// or a fatal error. Caller inputs are visible only to the first
    /// node of the invocation; keys the node never declared are
    /// discarded before they can reach the context.
    ///
    /// ## Errors
    ///
    /// Fatal errors (unknown node or `use`, undeclared condition,
    /// missing edge, failing collaborator) abort the step, leave
    /// `current` unchanged and record the diagnostic in
    /// `session.error`. Callers must not retry the same request
    /// automatically.
    pub async fn run(
        &self,
        session: &mut AuthenticationSession,
        inputs: Option<HashMap<String, String>>,
        repositories: &Repositories,
    ) -> EngineResult<()> {
        // Stale diagnostics from a previous step must not leak into
        // later renders.
        session.error = None;
        let mut pending_inputs = inputs;

        loop {
            let Some(node) = self.flow.nodes.get(&session.current) else {
                let error = EngineError::UnknownNode(session.current.clone());
                return Err(self.fatal(session, error));
            };
            let Some(def) = self.registry.lookup(&node.use_id) else {
                let error = EngineError::UnknownDefinition(node.use_id.clone());
                return Err(self.fatal(session, error));
            };

            let supplied: BTreeMap<String, String> = pending_inputs
                .take()
                .map(|raw| {
                    raw.into_iter()
                        .filter(|(key, _)| def.prompts.contains_key(key))
                        .collect()
                })
                .unwrap_or_default();

            let outcome = match def.node_type {
                NodeType::Result => {
                    return match self.run_terminal(node, &def, session, repositories).await {
                        Ok(()) => Ok(()),
                        Err(error) => Err(self.fatal(session, error)),
                    };
                }
                NodeType::Init | NodeType::Logic => {
                    match self
                        .invoke(node, &def, &supplied, &session.context, repositories)
                        .await
                    {
                        Ok(outcome @ NodeOutcome::Condition { .. }) => outcome,
                        Ok(_) => {
                            let error = EngineError::InvalidOutcome {
                                node: node.name.clone(),
                                message: "init and logic nodes must emit a condition".to_string(),
                            };
                            return Err(self.fatal(session, error));
                        }
                        Err(error) => return Err(self.fatal(session, error)),
                    }
                }
                NodeType::Query => {
                    let satisfied = !def.prompts.is_empty()
                        && def.prompts.keys().all(|key| supplied.contains_key(key));
                    if satisfied {
                        NodeOutcome::condition(labels::SUBMITTED)
                    } else {
                        NodeOutcome::Prompt(def.prompts.clone())
                    }
                }
                NodeType::QueryWithLogic => {
                    match self
                        .invoke(node, &def, &supplied, &session.context, repositories)
                        .await
                    {
                        Ok(NodeOutcome::Terminal(_)) => {
                            let error = EngineError::InvalidOutcome {
                                node: node.name.clone(),
                                message: "only result nodes may terminate the flow".to_string(),
                            };
                            return Err(self.fatal(session, error));
                        }
                        Ok(outcome) => outcome,
                        Err(error) => return Err(self.fatal(session, error)),
                    }
                }
            };

            match outcome {
                NodeOutcome::Prompt(prompts) => {
                    // An unchanged re-prompt appends nothing; the record
                    // is written only when the engine first suspends
                    // on this node.
                    if session.prompts.is_none() {
                        session.history.push(TransitionRecord::node(&node.name));
                    }
                    tracing::debug!(
                        flow = %self.flow.name,
                        node = %node.name,
                        "flow suspended awaiting user input"
                    );
                    session.prompts = Some(prompts);
                    return Ok(());
                }
                NodeOutcome::Condition { label, updates } => {
                    if !def.emits(&label) {
                        let error = EngineError::UndeclaredCondition {
                            node: node.name.clone(),
                            condition: label,
                        };
                        return Err(self.fatal(session, error));
                    }
                    let Some(target) = node.next.get(&label) else {
                        let error = EngineError::UndefinedTransition {
                            node: node.name.clone(),
                            condition: label,
                        };
                        return Err(self.fatal(session, error));
                    };

                    let record = if supplied.is_empty() {
                        TransitionRecord::condition(&node.name, &label)
                    } else {
                        TransitionRecord::submission(&node.name, &label, &supplied)
                    };
                    tracing::debug!(
                        flow = %self.flow.name,
                        node = %node.name,
                        condition = %label,
                        next = %target,
                        "flow transition"
                    );
                    session.history.push(record);
                    session.context.extend(supplied);
                    session.context.extend(updates);
                    session.prompts = None;
                    session.current = target.clone();
                }
                NodeOutcome::Terminal(_) => {
                    let error = EngineError::InvalidOutcome {
                        node: node.name.clone(),
                        message: "only result nodes may terminate the flow".to_string(),
                    };
                    return Err(self.fatal(session, error));
                }
            }
        }
    }

    /// Runs a Result node: sets the terminal result and outcome kind.
    async fn run_terminal(
        &self,
        node: &GraphNode,
        def: &NodeDefinition,
        session: &mut AuthenticationSession,
        repositories: &Repositories,
    ) -> EngineResult<()> {
        // Result nodes never consume caller inputs.
        let empty = BTreeMap::new();
        let outcome = self
            .invoke(node, def, &empty, &session.context, repositories)
            .await?;

        match outcome {
            NodeOutcome::Terminal(result) => {
                let Some(kind) = def.terminal else {
                    return Err(EngineError::InvalidOutcome {
                        node: node.name.clone(),
                        message: "result node declares no success/failure semantics".to_string(),
                    });
                };
                session.history.push(TransitionRecord::node(&node.name));
                session.prompts = None;
                session.result = Some(result);
                session.outcome = Some(kind);
                tracing::debug!(
                    flow = %self.flow.name,
                    node = %node.name,
                    outcome = ?kind,
                    "flow reached terminal node"
                );
                Ok(())
            }
            _ => Err(EngineError::InvalidOutcome {
                node: node.name.clone(),
                message: "result node must produce a terminal outcome".to_string(),
            }),
        }
    }

    /// Invokes the node's handler with a read-only step view.
    async fn invoke(
        &self,
        node: &GraphNode,
        def: &NodeDefinition,
        supplied: &BTreeMap<String, String>,
        context: &HashMap<String, String>,
        repositories: &Repositories,
    ) -> EngineResult<NodeOutcome> {
        let Some(handler) = &def.handler else {
            return Err(EngineError::InvalidOutcome {
                node: node.name.clone(),
                message: format!("node type '{}' has no handler registered", def.use_id),
            });
        };
        let step = StepContext {
            node,
            context,
            inputs: supplied,
        };
        handler.run(&step, repositories).await
    }

    /// Records a fatal error on the session and logs it.
    ///
    /// `current` is left unchanged so the caller can render an opaque
    /// error against the node that failed.
    fn fatal(&self, session: &mut AuthenticationSession, error: EngineError) -> EngineError {
        tracing::warn!(
            flow = %self.flow.name,
            node = %session.current,
            error = %error,
            "flow execution aborted"
        );
        session.error = Some(error.to_string());
        error
    }
}
