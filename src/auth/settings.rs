//! Immutable token signing settings, built once at startup.

use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::fmt;
use std::sync::Arc;

use super::error::ConfigurationError;
use crate::config::JWTConfig;

/// Six hours.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 6 * 60 * 60;

/// Algorithm used when minting tokens.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// The HMAC family: the only algorithms a presented token may advertise.
pub const ACCEPTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Signing secret and token lifetime, validated and frozen.
///
/// Cloning is cheap; the secret bytes are shared.
#[derive(Clone)]
pub struct TokenSettings {
    secret: Arc<[u8]>,
    lifetime: Duration,
}

impl TokenSettings {
    pub fn new(secret: impl AsRef<[u8]>, lifetime_secs: i64) -> Result<Self, ConfigurationError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ConfigurationError::MissingSecret);
        }
        if lifetime_secs <= 0 {
            return Err(ConfigurationError::InvalidLifetime(lifetime_secs));
        }
        Ok(TokenSettings {
            secret: Arc::from(secret),
            lifetime: Duration::seconds(lifetime_secs),
        })
    }

    pub fn from_config(config: &JWTConfig) -> Result<Self, ConfigurationError> {
        let secret = config
            .secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigurationError::MissingSecret)?;
        Self::new(secret, config.exp)
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
