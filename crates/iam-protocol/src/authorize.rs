//! Authorization-code finisher.
//!
//! Mints an opaque, single-use code bound to the authenticated
//! principal. Code redemption, PKCE and token formats are the OAuth2
//! layer's concern; this module only bridges the flow engine's terminal
//! outcome to a stored grant.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use iam_model::{AuthLevel, AuthenticationSession};
use parking_lot::Mutex;
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::handoff::{classify, AuthorizationOutcome};

/// Default lifetime of a minted code, in seconds.
pub const DEFAULT_CODE_TTL_SECONDS: i64 = 60;

/// Length of the minted alphanumeric code.
const CODE_LENGTH: usize = 32;

/// An authorization grant bound to a single-use code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    /// The opaque code handed to the client.
    pub code: String,
    /// Client the grant was issued to.
    pub client_id: String,
    /// Identifier of the authenticated principal.
    pub subject: String,
    /// Display name of the principal.
    pub username: String,
    /// Authentication strength achieved.
    pub auth_level: AuthLevel,
    /// When the code stops being redeemable.
    pub expires_at: DateTime<Utc>,
}

impl AuthorizationGrant {
    /// Whether the code is past its redemption window.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Storage for minted codes.
///
/// Implementations must make `consume` single-use: a code is returned
/// at most once, after which further consumes yield `None`.
#[async_trait::async_trait]
pub trait CodeStore: Send + Sync {
    /// Persists a freshly minted grant under its code.
    async fn store(&self, grant: &AuthorizationGrant) -> ProtocolResult<()>;

    /// Atomically removes and returns the grant for a code.
    ///
    /// Returns `None` for unknown, already-consumed or expired codes.
    async fn consume(&self, code: &str) -> ProtocolResult<Option<AuthorizationGrant>>;
}

/// In-memory code store for tests and embedded hosts.
#[derive(Debug, Default)]
pub struct InMemoryCodeStore {
    codes: Mutex<HashMap<String, AuthorizationGrant>>,
}

impl InMemoryCodeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn store(&self, grant: &AuthorizationGrant) -> ProtocolResult<()> {
        self.codes.lock().insert(grant.code.clone(), grant.clone());
        Ok(())
    }

    async fn consume(&self, code: &str) -> ProtocolResult<Option<AuthorizationGrant>> {
        let grant = self.codes.lock().remove(code);
        Ok(grant.filter(|g| !g.is_expired()))
    }
}

/// Turns finished flow runs into stored authorization codes.
pub struct AuthorizationCodeFinisher {
    store: Arc<dyn CodeStore>,
    code_ttl: Duration,
}

impl AuthorizationCodeFinisher {
    /// Creates a finisher with the default code lifetime.
    #[must_use]
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        Self {
            store,
            code_ttl: Duration::seconds(DEFAULT_CODE_TTL_SECONDS),
        }
    }

    /// Overrides the code lifetime.
    #[must_use]
    pub const fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    /// Finishes a flow run by minting and storing a single-use code.
    ///
    /// ## Errors
    ///
    /// Returns `access_denied` when the run ended on a failure terminal
    /// and `server_error` for handoff-contract violations or a failing
    /// code store.
    pub async fn finish(
        &self,
        session: &AuthenticationSession,
        client_id: &str,
    ) -> ProtocolResult<AuthorizationGrant> {
        match classify(session)? {
            AuthorizationOutcome::Granted {
                subject,
                username,
                auth_level,
            } => {
                let grant = AuthorizationGrant {
                    code: mint_code(),
                    client_id: client_id.to_string(),
                    subject,
                    username,
                    auth_level,
                    expires_at: Utc::now() + self.code_ttl,
                };
                self.store.store(&grant).await?;
                tracing::debug!(
                    flow = %session.flow_id,
                    client = %client_id,
                    subject = %grant.subject,
                    "authorization code minted"
                );
                Ok(grant)
            }
            AuthorizationOutcome::Denied => Err(ProtocolError::AccessDenied(
                "authentication failed".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for AuthorizationCodeFinisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationCodeFinisher")
            .field("code_ttl", &self.code_ttl)
            .finish_non_exhaustive()
    }
}

/// Generates an opaque 32-character alphanumeric code.
///
/// Roughly 190 bits of entropy from the thread-local CSPRNG.
fn mint_code() -> String {
    let mut rng = rand::rng();
    Alphanumeric.sample_string(&mut rng, CODE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_model::{FlowResult, TerminalKind};

    fn authenticated_session() -> AuthenticationSession {
        let mut session = AuthenticationSession::new("login", "init", Duration::minutes(10));
        session.outcome = Some(TerminalKind::Success);
        session.result = Some(FlowResult {
            user_id: "user-1".to_string(),
            username: "alice".to_string(),
            authenticated: true,
            auth_level: AuthLevel::OneFactor,
        });
        session
    }

    #[tokio::test]
    async fn minted_code_is_single_use() {
        let store = Arc::new(InMemoryCodeStore::new());
        let finisher = AuthorizationCodeFinisher::new(Arc::clone(&store) as Arc<dyn CodeStore>);

        let grant = finisher
            .finish(&authenticated_session(), "web-client")
            .await
            .unwrap();
        assert_eq!(grant.code.len(), CODE_LENGTH);
        assert_eq!(grant.subject, "user-1");

        let redeemed = store.consume(&grant.code).await.unwrap().unwrap();
        assert_eq!(redeemed, grant);
        assert!(store.consume(&grant.code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_code_is_not_redeemable() {
        let store = Arc::new(InMemoryCodeStore::new());
        let finisher = AuthorizationCodeFinisher::new(Arc::clone(&store) as Arc<dyn CodeStore>)
            .with_code_ttl(Duration::seconds(-1));

        let grant = finisher
            .finish(&authenticated_session(), "web-client")
            .await
            .unwrap();
        assert!(store.consume(&grant.code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_run_gets_no_code() {
        let store = Arc::new(InMemoryCodeStore::new());
        let finisher = AuthorizationCodeFinisher::new(store);

        let mut session = AuthenticationSession::new("login", "init", Duration::minutes(10));
        session.outcome = Some(TerminalKind::Failure);
        session.result = Some(FlowResult::default());

        let error = finisher.finish(&session, "web-client").await.unwrap_err();
        assert_eq!(error.error_code(), "access_denied");
    }

    #[tokio::test]
    async fn codes_are_unique() {
        let store = Arc::new(InMemoryCodeStore::new());
        let finisher = AuthorizationCodeFinisher::new(store);

        let first = finisher
            .finish(&authenticated_session(), "web-client")
            .await
            .unwrap();
        let second = finisher
            .finish(&authenticated_session(), "web-client")
            .await
            .unwrap();
        assert_ne!(first.code, second.code);
    }
}
