//! Request-level access control.
//!
//! Taking [`Identity`] as a handler argument makes the route authenticated:
//! the token is verified before the body is read and a failure answers 401
//! without running the handler.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use tracing::{debug, warn};

use super::error::TokenError;
use crate::models::Identity;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

#[axum::async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = HTTPError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).map(HeaderValue::as_bytes);

        match state.auth.verify_bytes(header) {
            Ok(identity) => Ok(identity),
            Err(e) => {
                match e {
                    TokenError::Missing => debug!("{} {}: {}", parts.method, parts.uri.path(), e),
                    _ => warn!("{} {}: rejected token: {}", parts.method, parts.uri.path(), e),
                }
                Err(e.into())
            }
        }
    }
}
