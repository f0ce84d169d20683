use crate::handlers::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::{ContactInput, ContactUpdate},
    AppState,
};
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: ContactUpdate,
}

#[derive(Debug, Deserialize)]
pub struct DeleteContactsRequest {
    pub items: String,
}

#[derive(Debug, Serialize)]
struct DeletedCount {
    deleted: u64,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let contacts = state
        .services
        .contacts
        .list(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(contacts))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<ContactInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let contact = state
        .services
        .contacts
        .create(user.user_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(contact))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateContactRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let contact = state
        .services
        .contacts
        .update(user.user_id, payload.id, payload.fields)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(contact))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<DeleteContactsRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let deleted = state
        .services
        .contacts
        .delete_many(user.user_id, &payload.items)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(DeletedCount { deleted }))
}
