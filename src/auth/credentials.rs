//! Password hashing.
//!
//! Passwords are hashed with bcrypt. The salt is drawn fresh for every hash
//! and stored inside the hash string itself, so verification needs nothing
//! but the stored value.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::error::{ConfigurationError, CredentialError};

/// Work factor used when the configuration does not name one.
pub const DEFAULT_COST: u32 = 14;
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// bcrypt ignores everything past this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// A one-way, salted password digest in bcrypt's modular crypt format.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wraps a hash read back from storage. No validation happens here;
    /// a malformed value surfaces on the first [`CredentialStore::verify`].
    pub fn from_stored(hash: impl Into<String>) -> Self {
        PasswordHash(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Hashes and verifies passwords with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct CredentialStore {
    cost: u32,
}

impl CredentialStore {
    pub fn new(cost: u32) -> Result<Self, ConfigurationError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(ConfigurationError::InvalidCost {
                got: cost,
                min: MIN_COST,
                max: MAX_COST,
            });
        }
        Ok(CredentialStore { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Whether `password` reaches bcrypt intact: at most 72 bytes, no NUL.
    pub fn is_hashable(password: &str) -> bool {
        password.len() <= MAX_PASSWORD_BYTES && !password.contains('\0')
    }

    /// Hashes `password`. CPU-bound: call it off the async worker threads.
    pub fn hash(&self, password: &str) -> Result<PasswordHash, CredentialError> {
        if !Self::is_hashable(password) {
            return Err(CredentialError::UnsupportedPassword);
        }
        bcrypt::hash(password, self.cost)
            .map(PasswordHash)
            .map_err(|e| CredentialError::HashingFailed(e.to_string()))
    }

    /// Checks `candidate` against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; only an unparseable stored hash is an error.
    pub fn verify(&self, stored: &PasswordHash, candidate: &str) -> Result<bool, CredentialError> {
        // Never hashed, so it cannot match; bcrypt would compare a truncated copy.
        if !Self::is_hashable(candidate) {
            debug!("Password verification skipped, candidate cannot be hashed");
            return Ok(false);
        }
        match bcrypt::verify(candidate, stored.as_str()) {
            Ok(matches) => {
                debug!("Password verification completed, match={}", matches);
                Ok(matches)
            }
            Err(e) => {
                warn!("Stored password hash could not be parsed: {}", e);
                Err(CredentialError::MalformedHash)
            }
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        CredentialStore { cost: DEFAULT_COST }
    }
}
