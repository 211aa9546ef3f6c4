//! # iam-model
//!
//! Domain models for the identity provider.
//!
//! This crate defines the entities shared by the flow engine, the storage
//! layer and the protocol handoff: the declarative flow graph, the
//! serializable execution session, and the user entity.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod flow;
pub mod session;
pub mod user;

pub use flow::{FlowDefinition, GraphNode, NodeType, PromptKind, TerminalKind};
pub use session::{AuthLevel, AuthenticationSession, FlowResult, PromptSet, TransitionRecord};
pub use user::User;
