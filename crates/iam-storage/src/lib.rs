//! # iam-storage
//!
//! Repository collaborator traits for the flow engine, plus an in-memory
//! implementation for tests and embedded hosts.
//!
//! Node handlers reach the data layer exclusively through these traits;
//! the host application constructs a [`Repositories`] bundle per tenant
//! and realm and passes it into every engine invocation.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod repositories;
pub mod user;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryUserRepository;
pub use repositories::Repositories;
pub use user::UserRepository;
