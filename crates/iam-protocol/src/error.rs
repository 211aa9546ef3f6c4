//! Protocol handoff error types.

use thiserror::Error;

/// Errors classifying a finished flow run.
///
/// These mark contract violations between the flow engine and the
/// protocol layer, not end-user failures: a denied authentication is a
/// regular [`AuthorizationOutcome::Denied`], never an error.
///
/// [`AuthorizationOutcome::Denied`]: crate::handoff::AuthorizationOutcome::Denied
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandoffError {
    /// The session has not reached a terminal node yet.
    #[error("flow run has not finished")]
    NotFinished,

    /// A success terminal produced no principal identifier.
    #[error("success terminal names no principal")]
    MissingPrincipal,
}

/// Errors surfaced by protocol finishers.
///
/// Modeled on the OAuth 2.0 error vocabulary: `access_denied` for a
/// failed authentication, `server_error` for everything the client
/// cannot fix by retrying with different credentials.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The resource owner did not authenticate.
    #[error("access_denied: {0}")]
    AccessDenied(String),

    /// The handoff contract was violated or a collaborator failed.
    #[error("server_error: {0}")]
    ServerError(String),
}

impl ProtocolError {
    /// Returns the wire-level error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccessDenied(_) => "access_denied",
            Self::ServerError(_) => "server_error",
        }
    }
}

impl From<HandoffError> for ProtocolError {
    fn from(error: HandoffError) -> Self {
        // Both variants are host-side bugs: the finisher ran against a
        // session it should never have been handed.
        Self::ServerError(error.to_string())
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(
            ProtocolError::AccessDenied("login failed".to_string()).error_code(),
            "access_denied"
        );
        assert_eq!(
            ProtocolError::from(HandoffError::NotFinished).error_code(),
            "server_error"
        );
    }
}
