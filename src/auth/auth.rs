use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::task::JoinError;
use tracing::{debug, error, info};

use super::credentials::{CredentialStore, PasswordHash};
use super::error::{ConfigurationError, CredentialError, TokenError};
use super::gate::AuthorizationGate;
use super::issuer::TokenIssuer;
use super::settings::TokenSettings;
use super::verifier::TokenVerifier;
use crate::config::{CredentialsConfig, JWTConfig};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::models::{Identity, NewUser, User};
use crate::store::{Store, StoreError};
use crate::utils::validation::{is_email_valid, is_password_valid};

/// Why an account could not be created.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password is shorter than the minimum length")]
    WeakPassword,

    #[error("password is longer than 72 bytes or contains a NUL byte")]
    UnsupportedPassword,

    #[error("an account with this email already exists")]
    AlreadyExists,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegistrationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => RegistrationError::AlreadyExists,
            other => RegistrationError::Store(other),
        }
    }
}

impl RegistrationError {
    fn label(&self) -> &'static str {
        match self {
            RegistrationError::InvalidEmail => "invalid_email",
            RegistrationError::WeakPassword => "weak_password",
            RegistrationError::UnsupportedPassword => "unsupported_password",
            RegistrationError::AlreadyExists => "already_exists",
            RegistrationError::Credential(_) => "hashing_failed",
            RegistrationError::Store(_) => "store_error",
        }
    }
}

/// Why a login did not produce a token.
#[derive(Debug, Error)]
pub enum LoginError {
    /// Unknown email and wrong password are deliberately the same variant.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LoginError {
    fn label(&self) -> &'static str {
        match self {
            LoginError::InvalidCredentials => "invalid_credentials",
            LoginError::Credential(_) => "credential_error",
            LoginError::Token(_) => "signing_failed",
            LoginError::Store(_) => "store_error",
        }
    }
}

/// Hashed once per process and checked against on logins for unknown
/// emails, so those cost as much bcrypt work as a wrong password.
const TIMING_DUMMY_PASSWORD: &str = "shopgate-unknown-account";

/// Moves CPU-bound bcrypt work off the async worker threads.
async fn run_blocking<T, F>(work: F) -> Result<T, CredentialError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CredentialError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e: JoinError| {
            error!("Password hashing task failed: {}", e);
            CredentialError::HashingFailed(e.to_string())
        })?
}

/// The authentication core: password hashing, token minting, token
/// verification and the ownership gate, all built from validated settings.
pub struct Auth {
    credentials: CredentialStore,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    gate: AuthorizationGate,
    store: Arc<dyn Store>,
    metrics: Metrics,
    dummy_hash: OnceCell<PasswordHash>,
}

impl Auth {
    /// Validates the raw configuration. Any error here must stop the process.
    pub fn new(
        jwt_config: &JWTConfig,
        credentials_config: &CredentialsConfig,
        store: Arc<dyn Store>,
        metrics: Metrics,
    ) -> Result<Self, ConfigurationError> {
        let settings = TokenSettings::from_config(jwt_config)?;
        let credentials = CredentialStore::new(credentials_config.cost)?;
        info!(
            "Auth initialised: token lifetime {}s, bcrypt cost {}",
            settings.lifetime().num_seconds(),
            credentials.cost()
        );

        Ok(Auth {
            credentials,
            issuer: TokenIssuer::new(&settings),
            verifier: TokenVerifier::new(&settings),
            gate: AuthorizationGate::new(store.clone()),
            store,
            metrics,
            dummy_hash: OnceCell::new(),
        })
    }

    /// Creates an account and returns its identity. Nothing is stored when
    /// hashing fails.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, RegistrationError> {
        let result = self.try_register(name, email, password).await;
        let label = match &result {
            Ok(_) => "created",
            Err(e) => e.label(),
        };
        self.metrics.record_registration(label);
        result
    }

    async fn try_register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, RegistrationError> {
        let email = email.trim().to_lowercase();
        if !is_email_valid(&email) {
            return Err(RegistrationError::InvalidEmail);
        }
        if !is_password_valid(password) {
            return Err(RegistrationError::WeakPassword);
        }
        if !CredentialStore::is_hashable(password) {
            return Err(RegistrationError::UnsupportedPassword);
        }
        if self.store.find_user_by_email(&email).await?.is_some() {
            debug!("Registration refused, email already in use");
            return Err(RegistrationError::AlreadyExists);
        }

        let password_hash = self.hash_password(password).await?;
        let id = self
            .store
            .insert_user(NewUser {
                name: name.to_string(),
                email,
                password_hash,
            })
            .await?;
        info!("Registered user {}", id);
        Ok(id)
    }

    /// Checks the credentials and mints a session token for the account.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), LoginError> {
        let result = self.try_login(email, password).await;
        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        self.metrics.record_login(label);
        result
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<(User, String), LoginError> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            let dummy = self.dummy_hash().await?;
            self.verify_password(dummy, password).await?;
            debug!("Login failed: no account for the given email");
            return Err(LoginError::InvalidCredentials);
        };

        if !self.verify_password(&user.password_hash, password).await? {
            debug!("Login failed: wrong password for user {}", user.id);
            return Err(LoginError::InvalidCredentials);
        }

        let token = self.issuer.issue(user.id)?;
        info!("User {} logged in", user.id);
        Ok((user, token))
    }

    /// Runs the token verifier on a raw `Authorization` header value.
    pub fn verify(&self, authorization: Option<&str>) -> Result<Identity, TokenError> {
        self.record_verification(self.verifier.verify(authorization))
    }

    /// Same as [`Auth::verify`] for header bytes straight off the wire.
    /// Bytes that are not UTF-8 are a malformed token.
    pub fn verify_bytes(&self, authorization: Option<&[u8]>) -> Result<Identity, TokenError> {
        match authorization.map(std::str::from_utf8).transpose() {
            Ok(header) => self.verify(header),
            Err(_) => self.record_verification(Err(TokenError::Malformed)),
        }
    }

    fn record_verification(
        &self,
        result: Result<Identity, TokenError>,
    ) -> Result<Identity, TokenError> {
        let label = match &result {
            Ok(_) => "valid",
            Err(e) => e.label(),
        };
        self.metrics.record_token_verification(label);
        result
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    async fn dummy_hash(&self) -> Result<&PasswordHash, CredentialError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_password(TIMING_DUMMY_PASSWORD))
            .await
    }

    async fn hash_password(&self, password: &str) -> Result<PasswordHash, CredentialError> {
        let credentials = self.credentials;
        let password = password.to_string();
        let started = Instant::now();
        let result = run_blocking(move || credentials.hash(&password)).await;
        self.metrics
            .record_hash_duration("hash", started.elapsed().as_secs_f64());
        result
    }

    async fn verify_password(
        &self,
        stored: &PasswordHash,
        candidate: &str,
    ) -> Result<bool, CredentialError> {
        let credentials = self.credentials;
        let stored = stored.clone();
        let candidate = candidate.to_string();
        let started = Instant::now();
        let result = run_blocking(move || credentials.verify(&stored, &candidate)).await;
        self.metrics
            .record_hash_duration("verify", started.elapsed().as_secs_f64());
        result
    }
}
