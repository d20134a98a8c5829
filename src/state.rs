//! Shared application state.

use crate::auth::Auth;
use crate::metrics::Metrics;
use crate::store::Store;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential hashing, token issue/verification and the ownership gate.
    pub auth: Arc<Auth>,
    /// Users, shops, products and categories.
    pub store: Arc<dyn Store>,
    pub metrics: Metrics,
}
