//! Error taxonomy of the authentication and authorization core.
//!
//! Every variant is returned as a typed value up to the HTTP boundary. Only
//! [`ConfigurationError`] is fatal, and only at startup.

use thiserror::Error;

/// Invalid startup configuration. Never produced while serving requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no token signing secret configured (set jwt.secret or SECRET_TOKEN)")]
    MissingSecret,

    #[error("token lifetime must be a positive number of seconds, got {0}")]
    InvalidLifetime(i64),

    #[error("password hashing cost must be between {min} and {max}, got {got}")]
    InvalidCost { got: u32, min: u32, max: u32 },
}

/// Failure while hashing or checking a password.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Hashing did not complete. The calling operation must be aborted.
    #[error("password hashing failed: {0}")]
    HashingFailed(String),

    /// The stored hash cannot be parsed, so no comparison took place.
    #[error("stored password hash is malformed")]
    MalformedHash,

    /// bcrypt only reads the first 72 bytes and stops at a NUL byte, so such
    /// a password cannot be hashed without colliding with another one.
    #[error("password is longer than 72 bytes or contains a NUL byte")]
    UnsupportedPassword,
}

/// Why a session token could not be minted or accepted.
///
/// The verification variants are useful in logs only; clients always receive
/// the same generic "not authenticated" answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("no bearer token was supplied")]
    Missing,

    #[error("token is not a well-formed bearer JWT")]
    Malformed,

    #[error("token advertises unaccepted signing algorithm '{0}'")]
    AlgorithmMismatch(String),

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token claims are missing or malformed")]
    MalformedClaims,

    #[error("token signing failed: {0}")]
    SigningFailed(String),
}

impl TokenError {
    /// Short stable label, used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TokenError::Missing => "missing",
            TokenError::Malformed => "malformed",
            TokenError::AlgorithmMismatch(_) => "algorithm_mismatch",
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired => "expired",
            TokenError::MalformedClaims => "malformed_claims",
            TokenError::SigningFailed(_) => "signing_failed",
        }
    }
}

/// Negative outcome of the authorization gate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// A mutation was attempted without a verified identity.
    #[error("not authenticated")]
    Unauthenticated,

    /// The target resource does not exist. Checked before ownership.
    #[error("resource not found")]
    NotFound,

    /// The caller is authenticated but does not own the target resource.
    #[error("caller does not own this resource")]
    NotOwner,
}

impl Denial {
    pub fn label(&self) -> &'static str {
        match self {
            Denial::Unauthenticated => "unauthenticated",
            Denial::NotFound => "not_found",
            Denial::NotOwner => "not_owner",
        }
    }
}
