use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::{header, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error};

use crate::auth::error::{CredentialError, Denial, TokenError};
use crate::auth::verifier::BEARER_SCHEME;
use crate::store::StoreError;

/// One message for every token failure, so clients learn nothing about why.
pub const NOT_AUTHENTICATED: &str =
    "You are not authenticated and therefore cannot perform this operation.";
pub const NOT_OWNER: &str = "You do not have permission to modify this resource.";
pub const INTERNAL: &str = "Something went wrong, please contact your administrator.";

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
    challenge: Option<String>,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code, message and
    /// optional `WWW-Authenticate` challenge.
    pub fn new(status: StatusCode, message: impl Into<String>, challenge: Option<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
            challenge,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, None)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, None)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message,
            Some(BEARER_SCHEME.to_string()),
        )
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Converts our `HTTPError` into a JSON response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(json!({ "message": self.message }))).into_response();
        if let Some(challenge) = self.challenge {
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

/// JSON request body. Any decoding failure, including a missing content type
/// or a missing field, is answered with 400.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HTTPError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(HTTPError::bad_request(
                    "Incorrect format, please send a valid JSON body.",
                ))
            }
        }
    }
}

/// Numeric id taken from the `:id` path segment. Anything else is a 400.
pub struct PathId(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = HTTPError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(PathId(id)),
            Err(rejection) => {
                debug!("Rejected path id: {}", rejection.body_text());
                Err(HTTPError::bad_request(
                    "Incorrect format, please enter a correct ID.",
                ))
            }
        }
    }
}

impl From<TokenError> for HTTPError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::SigningFailed(_) => HTTPError::internal(),
            _ => HTTPError::unauthorized(NOT_AUTHENTICATED),
        }
    }
}

impl From<Denial> for HTTPError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => HTTPError::unauthorized(NOT_AUTHENTICATED),
            Denial::NotFound => HTTPError::not_found("The requested resource does not exist."),
            Denial::NotOwner => HTTPError::new(StatusCode::FORBIDDEN, NOT_OWNER, None),
        }
    }
}

impl From<StoreError> for HTTPError {
    fn from(e: StoreError) -> Self {
        error!("Store error: {}", e);
        HTTPError::internal()
    }
}

impl From<CredentialError> for HTTPError {
    fn from(e: CredentialError) -> Self {
        error!("Credential error: {}", e);
        HTTPError::internal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_token_failure_looks_the_same_to_clients() {
        let errors = [
            TokenError::Missing,
            TokenError::Malformed,
            TokenError::AlgorithmMismatch("none".to_string()),
            TokenError::BadSignature,
            TokenError::Expired,
            TokenError::MalformedClaims,
        ];
        for e in errors {
            let http = HTTPError::from(e);
            assert_eq!(http.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(http.message(), NOT_AUTHENTICATED);
        }
    }

    #[test]
    fn denials_map_to_distinct_statuses() {
        assert_eq!(
            HTTPError::from(Denial::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(HTTPError::from(Denial::NotOwner).status(), StatusCode::FORBIDDEN);
        assert_eq!(HTTPError::from(Denial::NotFound).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_failures_do_not_leak_details() {
        let http = HTTPError::from(StoreError::Backend("connection refused".to_string()));
        assert_eq!(http.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!http.message().contains("connection"));

        let http = HTTPError::from(TokenError::SigningFailed("bad key".to_string()));
        assert_eq!(http.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthorized_response_carries_a_bearer_challenge() {
        let response = HTTPError::from(TokenError::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
