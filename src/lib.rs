//! Multi-vendor e-commerce backend: catalog feed ingestion, basket
//! management, and order placement behind a JSON API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared application state: injected storage handle, configuration, event
/// channel, and the service container.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// The v1 API surface.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(handlers::catalog::list_categories))
        .route("/shops", get(handlers::catalog::list_shops))
        .route("/products", get(handlers::catalog::list_products))
        .route(
            "/partner/state",
            get(handlers::partner::get_state).post(handlers::partner::set_state),
        )
        .route("/partner/update", post(handlers::partner::update_feed))
        .route("/partner/orders", get(handlers::partner::list_orders))
        .route(
            "/basket",
            get(handlers::basket::get_basket)
                .post(handlers::basket::add_items)
                .put(handlers::basket::update_items)
                .delete(handlers::basket::remove_items),
        )
        .route(
            "/order",
            get(handlers::orders::list_orders).post(handlers::orders::place_order),
        )
        .route(
            "/user/contact",
            get(handlers::contacts::list)
                .post(handlers::contacts::create)
                .put(handlers::contacts::update)
                .delete(handlers::contacts::remove),
        )
}

/// The full application router, with the v1 API nested under `/api/v1`.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
