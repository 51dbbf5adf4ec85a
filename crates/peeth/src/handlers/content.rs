//! Articles, teachings, events and announcements (`/api/content`).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use peeth_auth::{Admin, Authorized, Editor, OptionalUser};
use peeth_core::content::{
    Content, ContentListResponse, ContentStatus, CreateContentRequest, ListContentQuery,
    UpdateContentRequest,
};
use peeth_core::keys::CONTENT;
use peeth_core::ServiceError;

use super::{can_edit, AppError};
use crate::state::AppState;

fn visible_content(content: Content, editor: bool) -> Result<Content, AppError> {
    if content.is_published() || editor {
        Ok(content)
    } else {
        Err(ServiceError::not_found(CONTENT, content.id).into())
    }
}

/// List content, newest first (GET /api/content).
///
/// Query: `type`, `status`, `limit`, `cursor`. The public only ever sees
/// published items, whatever `status` says.
pub async fn list_content(
    State(state): State<AppState>,
    user: OptionalUser,
    Query(mut query): Query<ListContentQuery>,
) -> Result<Json<ContentListResponse>, AppError> {
    if !can_edit(&user) {
        query.status = Some(ContentStatus::Published);
    }
    Ok(Json(state.content.list(&query).await?))
}

/// Create content as a draft (POST /api/content).
pub async fn create_content(
    State(state): State<AppState>,
    auth: Authorized<Editor>,
    Json(payload): Json<CreateContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let content = state.content.create(payload, Some(auth.user.id)).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

/// GET /api/content/{id}
pub async fn get_content(
    State(state): State<AppState>,
    user: OptionalUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Content>, AppError> {
    let content = state.content.get(id).await?;
    Ok(Json(visible_content(content, can_edit(&user))?))
}

/// GET /api/content/slug/{slug}
pub async fn get_content_by_slug(
    State(state): State<AppState>,
    user: OptionalUser,
    Path(slug): Path<String>,
) -> Result<Json<Content>, AppError> {
    let content = state.content.get_by_slug(&slug).await?;
    Ok(Json(visible_content(content, can_edit(&user))?))
}

/// PUT /api/content/{id}
pub async fn update_content(
    State(state): State<AppState>,
    _auth: Authorized<Editor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateContentRequest>,
) -> Result<Json<Content>, AppError> {
    Ok(Json(state.content.update(id, payload).await?))
}

/// POST /api/content/{id}/publish
pub async fn publish_content(
    State(state): State<AppState>,
    _auth: Authorized<Editor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Content>, AppError> {
    Ok(Json(state.content.publish(id).await?))
}

/// DELETE /api/content/{id}
pub async fn delete_content(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.content.delete(id).await?;
    tracing::info!(content_id = %id, user_id = %auth.user.id, "Deleted content");
    Ok(StatusCode::NO_CONTENT)
}
