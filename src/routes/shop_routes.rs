//! Shop endpoints. Reads are public; changes are reserved to the owner.

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
use crate::models::{Identity, NewShop, Shop, ShopChanges};
use crate::state::AppState;
use crate::utils::http_helpers::{HTTPError, JsonBody, PathId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shops", get(list_shops).post(create_shop))
        .route(
            "/shops/:id",
            get(get_shop).put(update_shop).delete(delete_shop),
        )
}

#[derive(Deserialize)]
struct ShopRequest {
    name: String,
    address: String,
}

async fn create_shop(
    State(state): State<AppState>,
    owner: Identity,
    JsonBody(request): JsonBody<ShopRequest>,
) -> Result<impl IntoResponse, HTTPError> {
    let id = state
        .store
        .insert_shop(NewShop {
            name: request.name,
            address: request.address,
            owner_id: owner,
        })
        .await?;
    info!("User {} created shop {}", owner, id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "shopId": id, "message": "You created a shop!" })),
    ))
}

async fn list_shops(State(state): State<AppState>) -> Result<Json<Vec<Shop>>, HTTPError> {
    Ok(Json(state.store.list_shops().await?))
}

async fn get_shop(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<Shop>, HTTPError> {
    match enforce(&state, None, Resource::Shop(id), Action::Read).await? {
        Resolved::Shop(shop) => Ok(Json(shop)),
        Resolved::Product(_) => Err(HTTPError::internal()),
    }
}

async fn update_shop(
    State(state): State<AppState>,
    caller: Identity,
    PathId(id): PathId,
    JsonBody(changes): JsonBody<ShopChanges>,
) -> Result<impl IntoResponse, HTTPError> {
    enforce(&state, Some(caller), Resource::Shop(id), Action::Write).await?;
    if !state.store.update_shop(id, changes).await? {
        return Err(Denial::NotFound.into());
    }
    Ok(Json(json!({ "message": "Shop updated successfully." })))
}

async fn delete_shop(
    State(state): State<AppState>,
    caller: Identity,
    PathId(id): PathId,
) -> Result<impl IntoResponse, HTTPError> {
    enforce(&state, Some(caller), Resource::Shop(id), Action::Delete).await?;
    if !state.store.delete_shop(id).await? {
        return Err(Denial::NotFound.into());
    }
    info!("User {} deleted shop {}", caller, id);
    Ok(Json(json!({ "message": "Shop deleted successfully." })))
}
