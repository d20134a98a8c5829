//! HTTP route definitions and handlers.
//!
//! Handlers that take an [`Identity`](crate::models::Identity) argument are
//! the authenticated routes; every other route is public.

mod category_routes;
mod health_routes;
mod metrics;
mod product_routes;
mod shop_routes;
mod user_routes;

use crate::auth::{Action, Decision, Resolved, Resource};
use crate::metrics::MetricsRecorder;
use crate::models::Identity;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::Router;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(user_routes::routes())
        .merge(shop_routes::routes())
        .merge(product_routes::routes())
        .merge(category_routes::routes())
        .merge(health_routes::routes())
        .merge(metrics::routes())
        .with_state(state)
}

/// Asks the authorization gate about `resource` and turns a denial into the
/// matching HTTP error. On success the loaded record is returned.
async fn enforce(
    state: &AppState,
    identity: Option<Identity>,
    resource: Resource,
    action: Action,
) -> Result<Resolved, HTTPError> {
    let decision = state
        .auth
        .gate()
        .authorize(identity, resource, action)
        .await?;
    state
        .metrics
        .record_authorization(resource.label(), action.label(), decision.label());

    match decision {
        Decision::Allowed(resolved) => Ok(resolved),
        Decision::Denied(denial) => Err(denial.into()),
    }
}
