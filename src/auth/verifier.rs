//! Validation of inbound bearer tokens.
//!
//! Checks run in a fixed order and stop at the first failure:
//! bearer extraction, advertised algorithm, signature, expiry, claims.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::debug;

use super::claims::{Claims, WireClaims};
use super::error::TokenError;
use super::settings::{TokenSettings, ACCEPTED_ALGORITHMS};
use crate::models::Identity;

/// Authorization scheme a token must be presented under.
pub const BEARER_SCHEME: &str = "Bearer";

/// Only the algorithm name is read from the header before the signature is checked.
#[derive(Deserialize)]
struct AdvertisedHeader {
    alg: String,
}

pub struct TokenVerifier {
    key: DecodingKey,
}

impl TokenVerifier {
    pub fn new(settings: &TokenSettings) -> Self {
        TokenVerifier {
            key: DecodingKey::from_secret(settings.secret()),
        }
    }

    /// Verifies the raw `Authorization` header value and returns the bound identity.
    pub fn verify(&self, authorization: Option<&str>) -> Result<Identity, TokenError> {
        self.verify_at(authorization, Utc::now().timestamp())
    }

    /// Same as [`TokenVerifier::verify`] with an explicit current time (unix seconds).
    pub fn verify_at(&self, authorization: Option<&str>, now: i64) -> Result<Identity, TokenError> {
        let token = extract_bearer(authorization)?;
        let algorithm = check_algorithm(token)?;
        let payload = self.check_signature(token, algorithm)?;
        check_expiry(&payload, now)?;
        let claims = extract_claims(payload)?;
        debug!("Token verified for user {}", claims.subject);
        Ok(claims.subject)
    }

    fn check_signature(&self, token: &str, algorithm: Algorithm) -> Result<Value, TokenError> {
        // Expiry and claim shape are checked by the later steps.
        let mut validation = Validation::new(algorithm);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        decode::<Value>(token, &self.key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm => TokenError::AlgorithmMismatch(format!("{:?}", algorithm)),
                ErrorKind::Json(_) => TokenError::MalformedClaims,
                _ => TokenError::Malformed,
            })
    }
}

/// Strips the bearer scheme from a raw header value.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, TokenError> {
    let raw = authorization.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Err(TokenError::Missing);
    }

    let (scheme, token) = raw.split_once(' ').ok_or(TokenError::Malformed)?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(TokenError::Malformed);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Malformed);
    }
    Ok(token)
}

/// Reads the algorithm a token advertises without trusting anything else in it.
fn check_algorithm(token: &str) -> Result<Algorithm, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    let advertised: AdvertisedHeader =
        serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;

    match Algorithm::from_str(&advertised.alg) {
        Ok(alg) if ACCEPTED_ALGORITHMS.contains(&alg) => Ok(alg),
        _ => Err(TokenError::AlgorithmMismatch(advertised.alg)),
    }
}

/// Valid only while `now < exp`. A missing or non-integer `exp` fails closed.
fn check_expiry(payload: &Value, now: i64) -> Result<(), TokenError> {
    let exp = payload
        .get("exp")
        .and_then(Value::as_i64)
        .ok_or(TokenError::MalformedClaims)?;
    if now >= exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}

fn extract_claims(payload: Value) -> Result<Claims, TokenError> {
    let wire: WireClaims =
        serde_json::from_value(payload).map_err(|_| TokenError::MalformedClaims)?;
    Claims::try_from(wire)
}
