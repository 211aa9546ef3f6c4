//! Simple-auth finisher.
//!
//! The thinnest protocol layer over the flow engine: on success it
//! surfaces the authenticated principal directly, with no code or token
//! indirection. Token minting belongs to the host.

use chrono::{DateTime, Utc};
use iam_model::{AuthLevel, AuthenticationSession};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::handoff::{classify, AuthorizationOutcome};

/// The payload handed to the host after a successful simple-auth run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleAuthGrant {
    /// Identifier of the authenticated principal.
    pub subject: String,
    /// Display name of the principal.
    pub username: String,
    /// Authentication strength achieved.
    pub auth_level: AuthLevel,
    /// When the grant was issued.
    pub issued_at: DateTime<Utc>,
}

/// Turns finished flow runs into simple-auth grants.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleAuthFinisher;

impl SimpleAuthFinisher {
    /// Creates a finisher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Finishes a flow run.
    ///
    /// ## Errors
    ///
    /// Returns `access_denied` when the run ended on a failure terminal
    /// and `server_error` when the session violates the handoff
    /// contract (not finished, or success without a principal).
    pub fn finish(&self, session: &AuthenticationSession) -> ProtocolResult<SimpleAuthGrant> {
        match classify(session)? {
            AuthorizationOutcome::Granted {
                subject,
                username,
                auth_level,
            } => {
                tracing::debug!(flow = %session.flow_id, %subject, "simple auth grant issued");
                Ok(SimpleAuthGrant {
                    subject,
                    username,
                    auth_level,
                    issued_at: Utc::now(),
                })
            }
            AuthorizationOutcome::Denied => Err(ProtocolError::AccessDenied(
                "authentication failed".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use iam_model::{FlowResult, TerminalKind};

    fn finished_session(outcome: TerminalKind, user_id: &str) -> AuthenticationSession {
        let mut session = AuthenticationSession::new("login", "init", Duration::minutes(10));
        session.outcome = Some(outcome);
        session.result = Some(FlowResult {
            user_id: user_id.to_string(),
            username: if user_id.is_empty() { String::new() } else { "alice".to_string() },
            authenticated: !user_id.is_empty(),
            auth_level: AuthLevel::OneFactor,
        });
        session
    }

    #[test]
    fn success_yields_a_grant() {
        let session = finished_session(TerminalKind::Success, "user-1");
        let grant = SimpleAuthFinisher::new().finish(&session).unwrap();

        assert_eq!(grant.subject, "user-1");
        assert_eq!(grant.username, "alice");
        assert_eq!(grant.auth_level, AuthLevel::OneFactor);
    }

    #[test]
    fn failure_maps_to_access_denied() {
        let session = finished_session(TerminalKind::Failure, "");
        let error = SimpleAuthFinisher::new().finish(&session).unwrap_err();
        assert_eq!(error.error_code(), "access_denied");
    }

    #[test]
    fn unfinished_session_maps_to_server_error() {
        let session = AuthenticationSession::new("login", "init", Duration::minutes(10));
        let error = SimpleAuthFinisher::new().finish(&session).unwrap_err();
        assert_eq!(error.error_code(), "server_error");
    }
}
