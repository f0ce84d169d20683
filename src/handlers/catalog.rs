use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, services::ListingFilter, AppState};
use axum::extract::{Query, State};
use std::sync::Arc;

/// GET /categories — public category list.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let categories = state
        .services
        .catalog
        .list_categories()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(categories))
}

/// GET /shops — public list of active shops.
pub async fn list_shops(
    State(state): State<Arc<AppState>>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let shops = state
        .services
        .catalog
        .list_shops()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(shops))
}

/// GET /products?shop_id=&category_id= — listing search, filters AND-ed,
/// restricted to active shops.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ListingFilter>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let listings = state
        .services
        .catalog
        .search_listings(filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(listings))
}
