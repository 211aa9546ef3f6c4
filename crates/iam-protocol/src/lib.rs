//! # iam-protocol
//!
//! Protocol handoff for finished authentication flow runs.
//!
//! The flow engine ends a run on a terminal node; this crate classifies
//! that outcome and hands it to a protocol surface, either directly as
//! a simple-auth grant or as a single-use authorization code. The
//! classification rule is strict: only a Success terminal naming a
//! principal grants access, a populated result object alone never does.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod authorize;
pub mod error;
pub mod handoff;
pub mod simple;

pub use authorize::{
    AuthorizationCodeFinisher, AuthorizationGrant, CodeStore, InMemoryCodeStore,
    DEFAULT_CODE_TTL_SECONDS,
};
pub use error::{HandoffError, ProtocolError, ProtocolResult};
pub use handoff::{classify, AuthorizationOutcome};
pub use simple::{SimpleAuthFinisher, SimpleAuthGrant};
