//! User domain model.
//!
//! Users are the principal identity entities. They belong to a tenant and
//! realm and carry the credential and lockout state the built-in node
//! library operates on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user within a realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    // === Identity ===
    /// Unique identifier.
    pub id: Uuid,
    /// Tenant the user belongs to.
    pub tenant: String,
    /// Realm the user belongs to.
    pub realm: String,
    /// Unique username within the realm.
    pub username: String,
    /// Whether the account is enabled.
    pub enabled: bool,

    // === Profile ===
    /// Display name shown in consents and account pages.
    pub display_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Whether the email has been verified.
    pub email_verified: bool,

    // === Credentials ===
    /// Argon2id password hash, absent if no password is enrolled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Whether password authentication is locked for this account.
    pub password_locked: bool,
    /// Consecutive failed password attempts since the last success.
    pub failed_login_attempts: u32,

    // === Extensibility ===
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,

    // === Audit ===
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the user last logged in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates an enabled user with no credentials enrolled.
    #[must_use]
    pub fn new(
        tenant: impl Into<String>,
        realm: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            tenant: tenant.into(),
            realm: realm.into(),
            username: username.into(),
            enabled: true,
            display_name: None,
            email: None,
            email_verified: false,
            password_hash: None,
            password_locked: false,
            failed_login_attempts: 0,
            attributes: HashMap::new(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the password hash.
    #[must_use]
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    /// Whether a password credential is enrolled.
    #[must_use]
    pub const fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Records a failed password attempt, locking the account once the
    /// given threshold is reached.
    pub fn record_failed_login(&mut self, max_attempts: u32) {
        self.failed_login_attempts = self.failed_login_attempts.saturating_add(1);
        if self.failed_login_attempts >= max_attempts {
            self.password_locked = true;
        }
        self.updated_at = Utc::now();
    }

    /// Resets lockout state and stamps a successful login.
    pub fn record_successful_login(&mut self) {
        self.failed_login_attempts = 0;
        self.password_locked = false;
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_has_no_credentials() {
        let user = User::new("acme", "customers", "alice");
        assert!(user.enabled);
        assert!(!user.has_password());
        assert_eq!(user.failed_login_attempts, 0);
    }

    #[test]
    fn lockout_after_max_attempts() {
        let mut user = User::new("acme", "customers", "alice");
        user.record_failed_login(3);
        user.record_failed_login(3);
        assert!(!user.password_locked);

        user.record_failed_login(3);
        assert!(user.password_locked);
        assert_eq!(user.failed_login_attempts, 3);
    }

    #[test]
    fn successful_login_resets_lockout() {
        let mut user = User::new("acme", "customers", "alice");
        user.record_failed_login(1);
        assert!(user.password_locked);

        user.record_successful_login();
        assert!(!user.password_locked);
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.last_login_at.is_some());
    }
}
