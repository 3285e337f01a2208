use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::BlogPost;
use crate::services::BlogPostInput;

// ============================================================================
// Public
// ============================================================================

/// GET /blog
pub async fn list_published(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BlogPost>>>, ApiError> {
    let posts = state.blog_service().list_published().await?;
    Ok(Json(ApiResponse::success(posts)))
}

/// GET /blog/{slug}
pub async fn get_published(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<BlogPost>>, ApiError> {
    let post = state.blog_service().get_published(&slug).await?;
    Ok(Json(ApiResponse::success(post)))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /admin/blog
/// Every post, drafts included
pub async fn list_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BlogPost>>>, ApiError> {
    let posts = state.blog_service().list_all().await?;
    Ok(Json(ApiResponse::success(posts)))
}

/// POST /admin/blog
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BlogPostInput>,
) -> Result<Json<ApiResponse<BlogPost>>, ApiError> {
    let post = state.blog_service().create(payload).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// PUT /admin/blog/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<BlogPostInput>,
) -> Result<Json<ApiResponse<BlogPost>>, ApiError> {
    let id = validate_id(id)?;
    let post = state.blog_service().update(id, payload).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// DELETE /admin/blog/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id)?;
    state.blog_service().delete(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Blog post {id} deleted"),
    })))
}
