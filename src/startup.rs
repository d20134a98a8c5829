//! Application startup and server initialization.

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::auth::{Auth, ConfigurationError};
use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::routes;
use crate::state::AppState;
use crate::store::{create_store, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("could not open the store: {0}")]
    Store(#[from] StoreError),

    #[error("could not bind to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Opens the store and validates the auth settings. Fails before anything
/// is served when the configuration is unusable.
pub async fn build_state(config: &ConfigV1) -> Result<AppState, StartupError> {
    let store = create_store(&config.store, &config.categories).await?;
    let metrics = Metrics::new();
    let auth = Arc::new(Auth::new(
        &config.jwt,
        &config.credentials,
        store.clone(),
        metrics.clone(),
    )?);

    Ok(AppState {
        auth,
        store,
        metrics,
    })
}

/// Initializes and runs the application server until it stops.
pub async fn run(config: ConfigV1) -> Result<(), StartupError> {
    let state = build_state(&config).await?;
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;
    info!("Starting server on {}", config.bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(StartupError::Serve)
}
