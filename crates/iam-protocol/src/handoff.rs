//! Terminal-outcome classification.
//!
//! The single place where a finished flow run is turned into a protocol
//! decision. Classification keys on the terminal node's kind, never on
//! the mere presence of a result object: failure terminals also carry
//! one for rendering.

use iam_model::{AuthLevel, AuthenticationSession, TerminalKind};

use crate::error::HandoffError;

/// The protocol-facing verdict for one finished flow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// The run authenticated a principal.
    Granted {
        /// Identifier of the authenticated principal.
        subject: String,
        /// Display name of the principal.
        username: String,
        /// Authentication strength achieved.
        auth_level: AuthLevel,
    },
    /// The run ended on a failure terminal.
    Denied,
}

/// Classifies a finished session into a protocol outcome.
///
/// ## Errors
///
/// Returns [`HandoffError::NotFinished`] when the session never reached
/// a terminal node, and [`HandoffError::MissingPrincipal`] when a
/// success terminal carries no principal identifier. Both indicate the
/// host invoked the handoff out of order or deployed a broken flow.
pub fn classify(session: &AuthenticationSession) -> Result<AuthorizationOutcome, HandoffError> {
    match session.outcome {
        None => Err(HandoffError::NotFinished),
        Some(TerminalKind::Failure) => Ok(AuthorizationOutcome::Denied),
        Some(TerminalKind::Success) => {
            let principal = session
                .result
                .as_ref()
                .filter(|result| !result.user_id.is_empty())
                .ok_or(HandoffError::MissingPrincipal)?;
            Ok(AuthorizationOutcome::Granted {
                subject: principal.user_id.clone(),
                username: principal.username.clone(),
                auth_level: principal.auth_level,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use iam_model::FlowResult;

    fn session() -> AuthenticationSession {
        AuthenticationSession::new("login", "init", Duration::minutes(10))
    }

    #[test]
    fn unfinished_session_is_an_error() {
        assert_eq!(classify(&session()), Err(HandoffError::NotFinished));
    }

    #[test]
    fn failure_terminal_is_denied_even_with_result() {
        let mut session = session();
        session.outcome = Some(TerminalKind::Failure);
        session.result = Some(FlowResult::default());

        assert_eq!(classify(&session), Ok(AuthorizationOutcome::Denied));
    }

    #[test]
    fn success_terminal_with_principal_is_granted() {
        let mut session = session();
        session.outcome = Some(TerminalKind::Success);
        session.result = Some(FlowResult {
            user_id: "user-1".to_string(),
            username: "alice".to_string(),
            authenticated: true,
            auth_level: AuthLevel::OneFactor,
        });

        assert_eq!(
            classify(&session),
            Ok(AuthorizationOutcome::Granted {
                subject: "user-1".to_string(),
                username: "alice".to_string(),
                auth_level: AuthLevel::OneFactor,
            })
        );
    }

    #[test]
    fn success_terminal_without_principal_is_an_error() {
        let mut session = session();
        session.outcome = Some(TerminalKind::Success);
        session.result = Some(FlowResult::default());

        assert_eq!(classify(&session), Err(HandoffError::MissingPrincipal));
    }
}
