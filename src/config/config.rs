use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::logging::LoggingConfig;
use super::store::StoreConfig;
use crate::auth::credentials::DEFAULT_COST;
use crate::auth::settings::DEFAULT_TOKEN_LIFETIME_SECS;

/// Where the configuration file is looked up unless `SHOPGATE_CONFIG` says otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// Prefix of environment variables overriding configuration keys,
/// e.g. `SHOPGATE_JWT__EXP=3600`.
pub const ENV_PREFIX: &str = "SHOPGATE_";

/// Environment variable holding the token signing secret.
pub const SECRET_ENV_VAR: &str = "SECRET_TOKEN";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub jwt: JWTConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Names of the predefined product categories.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Session token settings. The secret is usually supplied through `SECRET_TOKEN`.
#[derive(Deserialize, Serialize, Clone, JsonSchema)]
pub struct JWTConfig {
    #[serde(default)]
    pub secret: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_lifetime")]
    pub exp: i64,
}

impl fmt::Debug for JWTConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JWTConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("exp", &self.exp)
            .finish()
    }
}

/// Password hashing settings.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct CredentialsConfig {
    /// bcrypt work factor.
    #[serde(default = "default_cost")]
    pub cost: u32,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        CredentialsConfig {
            cost: default_cost(),
        }
    }
}

fn default_token_lifetime() -> i64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

fn default_cost() -> u32 {
    DEFAULT_COST
}

/// The provider stack: YAML file, then `SECRET_TOKEN`, then `SHOPGATE_*` overrides.
pub fn figment(path: &str) -> Figment {
    let mut figment = Figment::new().merge(Yaml::file(path));
    // Read verbatim: a secret that looks like a number must stay a string.
    if let Ok(secret) = std::env::var(SECRET_ENV_VAR) {
        figment = figment.merge(Serialized::default("jwt.secret", secret));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
}

/// Extracts and unwraps a versioned configuration.
pub fn extract_config(figment: &Figment) -> Result<ConfigV1, figment::Error> {
    // handle configuration migration between versions here when necessary
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from the YAML file at `path`, with environment overrides applied.
pub fn load_config(path: &str) -> Result<ConfigV1, figment::Error> {
    extract_config(&figment(path))
}

/// Renders the JSON schema for the configuration.
pub fn config_schema() -> Result<String, serde_json::Error> {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema)
}
