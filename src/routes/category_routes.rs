use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::models::Category;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/categories", get(list_categories))
}

/// The predefined categories products may be filed under.
async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, HTTPError> {
    Ok(Json(state.store.list_categories().await?))
}
