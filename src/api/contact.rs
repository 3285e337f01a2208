use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::{validate_id, validate_page};
use super::{
    ApiError, ApiResponse, AppState, ContactListQuery, ContactSubmission, ContactUpdateRequest,
    MessageResponse,
};
use crate::constants::limits::DEFAULT_PAGE_SIZE;
use crate::db::ContactRequest;
use crate::services::ContactListing;

/// POST /contact-requests
/// Public contact form submission
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContactSubmission>,
) -> Result<Json<ApiResponse<ContactRequest>>, ApiError> {
    let created = state.contact_service().submit(payload.into()).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// GET /admin/contact-requests?status=&page=&limit=
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<ApiResponse<ContactListing>>, ApiError> {
    let page = validate_page(query.page.unwrap_or(1))?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let listing = state
        .contact_service()
        .list(query.status.as_deref(), page, limit)
        .await?;

    Ok(Json(ApiResponse::success(listing)))
}

/// PUT /admin/contact-requests/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ContactUpdateRequest>,
) -> Result<Json<ApiResponse<ContactRequest>>, ApiError> {
    let id = validate_id(id)?;
    let updated = state.contact_service().update(id, payload.into()).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /admin/contact-requests/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id)?;
    state.contact_service().delete(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Contact request {id} deleted"),
    })))
}
