//! Built-in node library.
//!
//! Node types are referenced from flow definitions by their `use`
//! identifier and registered through [`NodeRegistry::builtin`]. Custom
//! node types register alongside these through [`NodeRegistry::register`].
//!
//! [`NodeRegistry::builtin`]: crate::registry::NodeRegistry::builtin
//! [`NodeRegistry::register`]: crate::registry::NodeRegistry::register

pub mod password;
pub mod system;
pub mod user;
pub mod username;

use crate::registry::NodeDefinition;

/// Condition labels emitted by the built-in node library.
pub mod labels {
    /// Emitted by `init` to enter the flow.
    pub const START: &str = "start";
    /// Emitted by query nodes once all declared inputs are supplied.
    pub const SUBMITTED: &str = "submitted";
    /// The operation succeeded.
    pub const SUCCESS: &str = "success";
    /// The operation failed (recoverable flow outcome).
    pub const FAIL: &str = "fail";
    /// The account is locked out.
    pub const LOCKED: &str = "locked";
    /// The account has no password credential enrolled.
    pub const NO_PASSWORD: &str = "noPassword";
    /// The requested identifier is free.
    pub const AVAILABLE: &str = "available";
    /// The requested identifier is taken.
    pub const TAKEN: &str = "taken";
    /// Generic completion label for side-effect nodes.
    pub const DONE: &str = "done";
}

/// Well-known context keys shared between the built-in nodes.
pub mod keys {
    /// Username collected from the user.
    pub const USERNAME: &str = "username";
    /// Plaintext password collected from the user.
    pub const PASSWORD: &str = "password";
    /// Email address collected from the user.
    pub const EMAIL: &str = "email";
    /// Identifier of the resolved principal.
    pub const USER_ID: &str = "user_id";
    /// Authentication strength achieved so far ("0", "1" or "2").
    pub const AUTH_LEVEL: &str = "auth_level";
}

/// All definitions registered by [`NodeRegistry::builtin`].
///
/// [`NodeRegistry::builtin`]: crate::registry::NodeRegistry::builtin
#[must_use]
pub fn builtin_definitions() -> Vec<NodeDefinition> {
    vec![
        // System
        system::init_definition(),
        system::success_result_definition(),
        system::failure_result_definition(),
        system::set_variable_definition(),
        // Username
        username::ask_username_definition(),
        username::check_username_available_definition(),
        // Password
        password::ask_password_definition(),
        password::ask_username_password_definition(),
        password::validate_username_password_definition(),
        password::update_password_definition(),
        // User management
        user::create_user_definition(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_use_ids_are_unique() {
        let defs = builtin_definitions();
        let mut ids: Vec<&str> = defs.iter().map(|d| d.use_id).collect();
        ids.sort_unstable();
        let len = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), len);
    }
}
