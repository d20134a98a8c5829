//! Minting of session tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use tracing::{debug, error};

use super::claims::{Claims, WireClaims};
use super::error::TokenError;
use super::settings::{TokenSettings, SIGNING_ALGORITHM};
use crate::models::Identity;

/// Signs `{sub, exp}` tokens with the server secret.
pub struct TokenIssuer {
    key: EncodingKey,
    header: Header,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(settings: &TokenSettings) -> Self {
        TokenIssuer {
            key: EncodingKey::from_secret(settings.secret()),
            header: Header::new(SIGNING_ALGORITHM),
            lifetime: settings.lifetime(),
        }
    }

    /// Issues a token for `identity`, valid from now for the configured lifetime.
    ///
    /// Only the identifier is embedded. Callers holding a full user record pass
    /// `user.id`, so no other attribute can reach the payload.
    pub fn issue(&self, identity: Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            subject: identity,
            expires_at: (now + self.lifetime).timestamp(),
        };
        let token = encode(&self.header, &WireClaims::from(&claims), &self.key).map_err(|e| {
            error!("Failed to sign session token for user {}: {}", identity, e);
            TokenError::SigningFailed(e.to_string())
        })?;
        debug!(
            "Issued session token for user {} expiring at {}",
            identity, claims.expires_at
        );
        Ok(token)
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}
