//! # iam-flow
//!
//! Authentication flow execution engine.
//!
//! This crate interprets declarative flow graphs as resumable state
//! machines: the engine advances a session node by node until it must
//! ask the user for input or reaches a terminal result, and resumes
//! later from the persisted session.
//!
//! ## Features
//!
//! - Graph-based flow execution with suspension via serialization
//! - Pluggable node library keyed by `use` identifier
//! - Argon2id password hashing with lockout counters
//! - Structural and registry-aware flow validation
//!
//! ## Example
//!
//! ```ignore
//! use iam_flow::{Engine, NodeRegistry};
//! use iam_storage::Repositories;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(NodeRegistry::builtin());
//! let engine = Engine::new(flow, registry)?;
//! let mut session = engine.init_session();
//!
//! let repos = Repositories::in_memory();
//! engine.run(&mut session, None, &repos).await?;
//! // session.prompts now lists what to ask the user
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod engine;
pub mod error;
pub mod handler;
pub mod nodes;
pub mod password;
pub mod registry;
pub mod validation;

pub use engine::{Engine, DEFAULT_SESSION_TTL_MINUTES};
pub use error::{EngineError, EngineResult};
pub use handler::{NodeHandler, NodeOutcome, StepContext};
pub use password::{PasswordHasherService, PasswordPolicy};
pub use registry::{NodeDefinition, NodeRegistry};
pub use validation::{validate_flow, validate_flow_with_registry};
