//! Product endpoints. A product is owned through the shop it is listed in.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::enforce;
use crate::auth::{Action, Denial, Resolved, Resource};
use crate::models::{Identity, NewProduct, Product, ProductChanges, ShopId};
use crate::state::AppState;
use crate::utils::http_helpers::{HTTPError, JsonBody, PathId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRequest {
    shop_id: ShopId,
    name: String,
    description: String,
    categories: Vec<String>,
}

const UNKNOWN_CATEGORY: &str = "One of the categories is not a known category, see GET /categories for the list.";

/// Every named category must be one of the predefined ones, and at least one
/// must be given.
async fn check_categories(state: &AppState, categories: &[String]) -> Result<(), HTTPError> {
    if categories.is_empty() {
        return Err(HTTPError::bad_request(
            "Please name at least one category, see GET /categories for the list.",
        ));
    }
    let known = state.store.list_categories().await?;
    if categories
        .iter()
        .all(|name| known.iter().any(|c| &c.name == name))
    {
        Ok(())
    } else {
        Err(HTTPError::bad_request(UNKNOWN_CATEGORY))
    }
}

async fn create_product(
    State(state): State<AppState>,
    caller: Identity,
    JsonBody(request): JsonBody<ProductRequest>,
) -> Result<impl IntoResponse, HTTPError> {
    check_categories(&state, &request.categories).await?;

    // The target shop comes from the body, so a missing one is a bad request.
    match enforce(
        &state,
        Some(caller),
        Resource::Shop(request.shop_id),
        Action::Write,
    )
    .await
    {
        Ok(_) => {}
        Err(e) if e.status() == StatusCode::NOT_FOUND => {
            return Err(HTTPError::bad_request("Shop does not exist."));
        }
        Err(e) => return Err(e),
    }

    let id = state
        .store
        .insert_product(NewProduct {
            shop_id: request.shop_id,
            name: request.name,
            description: request.description,
            categories: request.categories,
        })
        .await?;
    info!(
        "User {} created product {} in shop {}",
        caller, id, request.shop_id
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "productId": id, "message": "You created a new product!" })),
    ))
}

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, HTTPError> {
    Ok(Json(state.store.list_products().await?))
}

async fn get_product(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<Product>, HTTPError> {
    match enforce(&state, None, Resource::Product(id), Action::Read).await? {
        Resolved::Product(product) => Ok(Json(product)),
        Resolved::Shop(_) => Err(HTTPError::internal()),
    }
}

async fn update_product(
    State(state): State<AppState>,
    caller: Identity,
    PathId(id): PathId,
    JsonBody(changes): JsonBody<ProductChanges>,
) -> Result<impl IntoResponse, HTTPError> {
    enforce(&state, Some(caller), Resource::Product(id), Action::Write).await?;
    check_categories(&state, &changes.categories).await?;
    if !state.store.update_product(id, changes).await? {
        return Err(Denial::NotFound.into());
    }
    Ok(Json(json!({ "message": "Product updated successfully." })))
}

async fn delete_product(
    State(state): State<AppState>,
    caller: Identity,
    PathId(id): PathId,
) -> Result<impl IntoResponse, HTTPError> {
    enforce(&state, Some(caller), Resource::Product(id), Action::Delete).await?;
    if !state.store.delete_product(id).await? {
        return Err(Denial::NotFound.into());
    }
    info!("User {} deleted product {}", caller, id);
    Ok(Json(json!({ "message": "Product deleted successfully." })))
}
