//! User management (`/api/users`). Admins manage users; only super admins
//! hand out roles above `content_editor`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use peeth_auth::{Admin, AuthError, Authorized, SuperAdmin};
use peeth_core::auth::AuthError as CoreAuthError;
use peeth_core::users::{CreateUserRequest, Role, UpdateRoleRequest, User};

use super::AppError;
use crate::state::AppState;

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.users.list_users().await?))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = payload.role.unwrap_or_default();
    if role > Role::ContentEditor && !auth.user.role.has_privilege(Role::SuperAdmin) {
        return Err(AuthError::from(CoreAuthError::Forbidden {
            required: Role::SuperAdmin,
        })
        .into());
    }

    let user = state.users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.require_user(id).await?))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let target = state.users.require_user(id).await?;
    if target.role > auth.user.role {
        return Err(AuthError::from(CoreAuthError::Forbidden {
            required: target.role,
        })
        .into());
    }

    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/users/{id}/role
pub async fn update_role(
    State(state): State<AppState>,
    _auth: Authorized<SuperAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.update_role(id, payload.role).await?))
}
