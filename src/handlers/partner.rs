use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{auth::AuthUser, errors::ApiError, AppState};
use axum::extract::{Json, State};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SetStateRequest {
    pub state: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FeedUpdateRequest {
    #[validate(length(min = 1))]
    pub url: String,
}

/// GET /partner/state — the vendor's own shop, including the active flag.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    user.require_vendor()?;

    let shop = state
        .services
        .shops
        .get_own_shop(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(shop))
}

/// POST /partner/state — toggle the shop's buyer-facing visibility.
pub async fn set_state(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<SetStateRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    user.require_vendor()?;

    let shop = state
        .services
        .shops
        .set_state(user.user_id, payload.state)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(shop))
}

/// POST /partner/update — pull the vendor's price feed from `url` and
/// replace the shop's listings.
pub async fn update_feed(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<FeedUpdateRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    user.require_vendor()?;
    validate_input(&payload)?;

    let summary = state
        .services
        .importer
        .import_from_url(user.user_id, &payload.url)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

/// GET /partner/orders — placed orders containing this shop's listings.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    user.require_vendor()?;

    let orders = state
        .services
        .orders
        .list_partner_orders(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}
