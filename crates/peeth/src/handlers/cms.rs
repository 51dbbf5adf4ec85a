//! CMS pages and their components (`/api/cms`).
//!
//! Reads are public but only show published pages and visible components
//! unless the caller is a content editor.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use peeth_auth::{Admin, Authorized, Editor, OptionalUser};
use peeth_core::cms::{
    CmsComponent, CmsPage, CreateComponentRequest, CreatePageRequest, PageWithComponents,
    ReorderComponentsRequest, UpdateComponentRequest, UpdatePageRequest,
};
use peeth_core::keys::CMS_PAGE;
use peeth_core::ServiceError;

use super::{can_edit, AppError};
use crate::state::AppState;

/// Drafts are "not found" for the public.
fn visible_page(page: CmsPage, editor: bool) -> Result<CmsPage, AppError> {
    if page.published || editor {
        Ok(page)
    } else {
        Err(ServiceError::not_found(CMS_PAGE, page.id).into())
    }
}

fn public_view(mut page: PageWithComponents, editor: bool) -> PageWithComponents {
    if !editor {
        page.components.retain(|component| component.visible);
    }
    page
}

/// List pages by display order (GET /api/cms/pages).
pub async fn list_pages(
    State(state): State<AppState>,
    user: OptionalUser,
) -> Result<Json<Vec<CmsPage>>, AppError> {
    let editor = can_edit(&user);
    let mut pages = state.cms.list_pages().await?;
    if !editor {
        pages.retain(|page| page.published);
    }
    Ok(Json(pages))
}

/// Create a page (POST /api/cms/pages).
pub async fn create_page(
    State(state): State<AppState>,
    auth: Authorized<Editor>,
    Json(payload): Json<CreatePageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.cms.create_page(payload).await?;
    tracing::info!(page_id = %page.id, user_id = %auth.user.id, "Created page");
    Ok((StatusCode::CREATED, Json(page)))
}

/// Get a page with its components (GET /api/cms/pages/{id}).
pub async fn get_page(
    State(state): State<AppState>,
    user: OptionalUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PageWithComponents>, AppError> {
    let editor = can_edit(&user);
    let page = visible_page(state.cms.get_page(id).await?, editor)?;
    let page = state.cms.with_components(page).await?;
    Ok(Json(public_view(page, editor)))
}

/// Get a page by slug (GET /api/cms/pages/slug/{slug}).
pub async fn get_page_by_slug(
    State(state): State<AppState>,
    user: OptionalUser,
    Path(slug): Path<String>,
) -> Result<Json<PageWithComponents>, AppError> {
    let editor = can_edit(&user);
    let page = visible_page(state.cms.get_page_by_slug(&slug).await?, editor)?;
    let page = state.cms.with_components(page).await?;
    Ok(Json(public_view(page, editor)))
}

/// Update a page (PUT /api/cms/pages/{id}).
pub async fn update_page(
    State(state): State<AppState>,
    _auth: Authorized<Editor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePageRequest>,
) -> Result<Json<CmsPage>, AppError> {
    Ok(Json(state.cms.update_page(id, payload).await?))
}

/// Delete a page and all of its components (DELETE /api/cms/pages/{id}).
pub async fn delete_page(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.cms.delete_page(id).await?;
    tracing::info!(page_id = %id, user_id = %auth.user.id, "Deleted page");
    Ok(StatusCode::NO_CONTENT)
}

/// Components of a page in display order (GET /api/cms/pages/{id}/components).
pub async fn list_components(
    State(state): State<AppState>,
    user: OptionalUser,
    Path(page_id): Path<Uuid>,
) -> Result<Json<Vec<CmsComponent>>, AppError> {
    let editor = can_edit(&user);
    visible_page(state.cms.get_page(page_id).await?, editor)?;

    let mut components = state.cms.find_components_by_page(page_id).await?;
    if !editor {
        components.retain(|component| component.visible);
    }
    Ok(Json(components))
}

/// Add a component to a page (POST /api/cms/pages/{id}/components).
pub async fn create_component(
    State(state): State<AppState>,
    _auth: Authorized<Editor>,
    Path(page_id): Path<Uuid>,
    Json(payload): Json<CreateComponentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let component = state.cms.create_component(page_id, payload).await?;
    Ok((StatusCode::CREATED, Json(component)))
}

/// Reorder every component of a page (PUT /api/cms/pages/{id}/components/order).
pub async fn reorder_components(
    State(state): State<AppState>,
    _auth: Authorized<Editor>,
    Path(page_id): Path<Uuid>,
    Json(payload): Json<ReorderComponentsRequest>,
) -> Result<Json<Vec<CmsComponent>>, AppError> {
    Ok(Json(state.cms.reorder_components(page_id, payload).await?))
}

/// GET /api/cms/components/{id}
pub async fn get_component(
    State(state): State<AppState>,
    user: OptionalUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CmsComponent>, AppError> {
    let component = state.cms.get_component(id).await?;
    if !can_edit(&user) {
        let page = state.cms.get_page(component.page_id).await?;
        if !(page.published && component.visible) {
            return Err(ServiceError::not_found(peeth_core::keys::CMS_COMPONENT, id).into());
        }
    }
    Ok(Json(component))
}

/// PUT /api/cms/components/{id}
pub async fn update_component(
    State(state): State<AppState>,
    _auth: Authorized<Editor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateComponentRequest>,
) -> Result<Json<CmsComponent>, AppError> {
    Ok(Json(state.cms.update_component(id, payload).await?))
}

/// DELETE /api/cms/components/{id}
pub async fn delete_component(
    State(state): State<AppState>,
    _auth: Authorized<Editor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.cms.delete_component(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
