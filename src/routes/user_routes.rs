//! Registration and login.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::auth::credentials::MAX_PASSWORD_BYTES;
use crate::auth::verifier::BEARER_SCHEME;
use crate::auth::{LoginError, RegistrationError};
use crate::state::AppState;
use crate::utils::http_helpers::{HTTPError, JsonBody};
use crate::utils::validation::MIN_PASSWORD_LEN;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/login", post(login))
}

#[derive(Deserialize)]
struct RegistrationRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

const INVALID_LOGIN: &str = "Invalid email or password.";

impl From<RegistrationError> for HTTPError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::InvalidEmail => HTTPError::bad_request("Please enter a correct email."),
            RegistrationError::WeakPassword => HTTPError::bad_request(format!(
                "Password too short, please use a password of at least {} characters.",
                MIN_PASSWORD_LEN
            )),
            RegistrationError::UnsupportedPassword => HTTPError::bad_request(format!(
                "Password too long, please use at most {} bytes and no NUL characters.",
                MAX_PASSWORD_BYTES
            )),
            RegistrationError::AlreadyExists => {
                HTTPError::bad_request("An account already exists with this email.")
            }
            RegistrationError::Credential(e) => e.into(),
            RegistrationError::Store(e) => e.into(),
        }
    }
}

impl From<LoginError> for HTTPError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::InvalidCredentials => HTTPError::unauthorized(INVALID_LOGIN),
            // An unreadable stored hash must not tell the caller the account exists.
            LoginError::Credential(e) => {
                error!("Login aborted: {}", e);
                HTTPError::unauthorized(INVALID_LOGIN)
            }
            LoginError::Token(e) => e.into(),
            LoginError::Store(e) => e.into(),
        }
    }
}

/// Creates an account. The password is stored only as a bcrypt hash.
async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegistrationRequest>,
) -> Result<impl IntoResponse, HTTPError> {
    let id = state
        .auth
        .register(&request.name, &request.email, &request.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "userId": id, "message": "You created an account!" })),
    ))
}

/// Exchanges email and password for a session token, returned in the
/// `Authorization` response header.
async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, HTTPError> {
    let (user, token) = state.auth.login(&request.email, &request.password).await?;
    Ok((
        StatusCode::OK,
        [(header::AUTHORIZATION, format!("{} {}", BEARER_SCHEME, token))],
        Json(json!({ "message": format!("Welcome back, {}!", user.name) })),
    ))
}
