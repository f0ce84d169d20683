use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::{BasketItemInput, BasketItemUpdate},
    AppState,
};
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemsRequest {
    #[validate]
    pub items: Vec<BasketItemInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemsRequest {
    #[validate]
    pub items: Vec<BasketItemUpdate>,
}

/// Comma-separated item id list, matching the wire shape of the delete call.
#[derive(Debug, Deserialize)]
pub struct RemoveItemsRequest {
    pub items: String,
}

#[derive(Debug, Serialize)]
struct CreatedCount {
    created: u64,
}

#[derive(Debug, Serialize)]
struct UpdatedCount {
    updated: u64,
}

#[derive(Debug, Serialize)]
struct DeletedCount {
    deleted: u64,
}

/// GET /basket — the caller's basket with items and live total.
pub async fn get_basket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let basket = state
        .services
        .basket
        .get_basket(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(basket))
}

/// POST /basket — add a batch of (listing, quantity) pairs.
pub async fn add_items(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<AddItemsRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .basket
        .add_items(user.user_id, payload.items)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CreatedCount { created }))
}

/// PUT /basket — update quantities in place.
pub async fn update_items(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateItemsRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let updated = state
        .services
        .basket
        .update_items(user.user_id, payload.items)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(UpdatedCount { updated }))
}

/// DELETE /basket — remove the listed items.
pub async fn remove_items(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<RemoveItemsRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let deleted = state
        .services
        .basket
        .remove_items(user.user_id, &payload.items)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(DeletedCount { deleted }))
}
