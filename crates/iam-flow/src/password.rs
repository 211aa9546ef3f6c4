//! Password hashing and verification using Argon2id.
//!
//! Memory-hard hashing with per-password random salts and constant-time
//! verification, used by the password node library.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{EngineError, EngineResult};

/// Password hashing parameters.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length in bytes.
    pub hash_length: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
        }
    }
}

impl PasswordPolicy {
    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the parallelism factor.
    #[must_use]
    pub const fn parallelism(mut self, p: u32) -> Self {
        self.parallelism = p;
        self
    }
}

/// Password hasher using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasherService {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasherService {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PasswordHasherService {
    /// Creates a hasher with the default policy.
    #[must_use]
    pub fn with_defaults() -> Self {
        let policy = PasswordPolicy::default();
        // The default policy values are statically within Argon2's
        // accepted ranges.
        let params = Params::new(
            policy.memory_cost,
            policy.time_cost,
            policy.parallelism,
            Some(policy.hash_length as usize),
        )
        .unwrap_or_default();
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Creates a hasher with the given policy.
    ///
    /// ## Errors
    ///
    /// Returns [`EngineError::Crypto`] if the policy parameters are out
    /// of range.
    pub fn new(policy: &PasswordPolicy) -> EngineResult<Self> {
        let params = Params::new(
            policy.memory_cost,
            policy.time_cost,
            policy.parallelism,
            Some(policy.hash_length as usize),
        )
        .map_err(|e| EngineError::Crypto(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes a password with a fresh random salt.
    ///
    /// ## Errors
    ///
    /// Returns [`EngineError::Crypto`] if hashing fails.
    pub fn hash(&self, password: &str) -> EngineResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| EngineError::Crypto(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verifies a password against a stored hash.
    ///
    /// Returns `Ok(false)` for a wrong password: that is a flow
    /// outcome, not an error.
    ///
    /// ## Errors
    ///
    /// Returns [`EngineError::Crypto`] if the stored hash is malformed.
    pub fn verify(&self, password: &str, hash: &str) -> EngineResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| EngineError::Crypto(e.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(EngineError::Crypto(e.to_string())),
        }
    }
}
