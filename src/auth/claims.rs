use serde::{Deserialize, Serialize};

use super::error::TokenError;
use crate::models::Identity;

/// The exact payload of a session token: subject and expiry, nothing else.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct WireClaims {
    pub sub: String,
    pub exp: i64,
}

/// Claims of a verified token, with the subject parsed into an [`Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claims {
    pub subject: Identity,
    pub expires_at: i64,
}

impl From<&Claims> for WireClaims {
    fn from(claims: &Claims) -> Self {
        WireClaims {
            sub: claims.subject.to_string(),
            exp: claims.expires_at,
        }
    }
}

impl TryFrom<WireClaims> for Claims {
    type Error = TokenError;

    fn try_from(wire: WireClaims) -> Result<Self, Self::Error> {
        let subject = wire
            .sub
            .parse::<Identity>()
            .map_err(|_| TokenError::MalformedClaims)?;
        Ok(Claims {
            subject,
            expires_at: wire.exp,
        })
    }
}
