pub mod auth;
mod claims;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod issuer;
pub mod settings;
pub mod verifier;

pub use auth::{Auth, LoginError, RegistrationError};
pub use claims::Claims;
pub use credentials::{CredentialStore, PasswordHash};
pub use error::{ConfigurationError, CredentialError, Denial, TokenError};
pub use gate::{Action, AuthorizationGate, Decision, Resolved, Resource};
pub use issuer::TokenIssuer;
pub use settings::TokenSettings;
pub use verifier::TokenVerifier;
