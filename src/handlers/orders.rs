use crate::handlers::common::{map_service_error, success_response};
use crate::{auth::AuthUser, errors::ApiError, AppState};
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub id: Uuid,
    pub contact: Uuid,
}

#[derive(Debug, Serialize)]
struct Placed {
    placed: bool,
}

/// GET /order — the caller's placed orders with totals.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_orders(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

/// POST /order — checkout: attach a delivery contact and move the basket to
/// the `new` state.
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .orders
        .place_order(user.user_id, payload.id, payload.contact)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(Placed { placed: true }))
}
