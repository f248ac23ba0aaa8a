// handlers/protected/nodes.rs - /api/nodes/* handlers
//
// Reads need an active, confirmed account; writes need ADMIN or SUDO.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::{parse_id, resolve_depth, Deleted, NodeView, PageParams};
use crate::auth::permissions;
use crate::config;
use crate::locale::RequestLocale;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, Page};
use crate::services::{NodePayload, NodeService};

#[derive(Debug, Default, Deserialize)]
pub struct NodeListQuery {
    /// List the children of this node instead of the roots
    pub parent: Option<String>,
    pub depth: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DepthQuery {
    pub depth: Option<String>,
}

fn levels(depth: Option<&str>) -> u32 {
    resolve_depth(depth, config::config().api.max_tree_depth)
}

/// GET /api/nodes - Paginated active nodes with children per `?depth=`
pub async fn list(
    Extension(user): Extension<CurrentUser>,
    Extension(locale): Extension<RequestLocale>,
    query: Result<Query<NodeListQuery>, QueryRejection>,
    page: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Page<NodeView>> {
    permissions::require_read(&user)?;
    let Query(query) = query?;
    let Query(page) = page?;

    let parent = match query.parent.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => Some(parse_id(raw)?),
        None => None,
    };
    let (limit, offset) = page.resolve();

    let page = NodeService::new()
        .await?
        .list(parent, limit, offset, levels(query.depth.as_deref()), &locale)
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/nodes - Create a node under `parent` (or as a root)
pub async fn create(
    Extension(user): Extension<CurrentUser>,
    Extension(locale): Extension<RequestLocale>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<NodeView> {
    permissions::require_node_write(&user)?;
    let Json(body) = payload?;
    let payload = NodePayload::from_json(body)?;

    let node = NodeService::new().await?.create(payload, &user).await?;
    Ok(ApiResponse::created(NodeView::flat(&node, &locale)))
}

/// GET /api/nodes/:id - One active node with its subtree per `?depth=`
pub async fn get(
    Extension(user): Extension<CurrentUser>,
    Extension(locale): Extension<RequestLocale>,
    Path(raw_id): Path<String>,
    query: Result<Query<DepthQuery>, QueryRejection>,
) -> ApiResult<NodeView> {
    permissions::require_read(&user)?;
    let id = parse_id(&raw_id)?;
    let Query(query) = query?;

    let view = NodeService::new()
        .await?
        .get(id, levels(query.depth.as_deref()), &locale)
        .await?;
    Ok(ApiResponse::success(view))
}

/// PUT /api/nodes/:id - Replace content (required) and optionally parent
pub async fn put(
    user: Extension<CurrentUser>,
    locale: Extension<RequestLocale>,
    raw_id: Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<NodeView> {
    update(user, locale, raw_id, payload, false).await
}

/// PATCH /api/nodes/:id - Change only the fields sent
pub async fn patch(
    user: Extension<CurrentUser>,
    locale: Extension<RequestLocale>,
    raw_id: Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<NodeView> {
    update(user, locale, raw_id, payload, true).await
}

async fn update(
    Extension(user): Extension<CurrentUser>,
    Extension(locale): Extension<RequestLocale>,
    Path(raw_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
    partial: bool,
) -> ApiResult<NodeView> {
    permissions::require_node_write(&user)?;
    let id = parse_id(&raw_id)?;
    let Json(body) = payload?;
    let payload = NodePayload::from_json(body)?;

    let service = NodeService::new().await?;
    service.update(id, payload, partial, &user).await?;
    let view = service.get(id, 1, &locale).await?;
    Ok(ApiResponse::success(view))
}

/// DELETE /api/nodes/:id - Soft delete; refused while active children exist
pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> ApiResult<Deleted> {
    permissions::require_node_write(&user)?;
    let id = parse_id(&raw_id)?;

    NodeService::new().await?.delete(id, &user).await?;
    Ok(ApiResponse::success(Deleted::node(id)))
}

/// POST /api/nodes/:id/restore - Undo a soft delete
pub async fn restore(
    Extension(user): Extension<CurrentUser>,
    Extension(locale): Extension<RequestLocale>,
    Path(raw_id): Path<String>,
) -> ApiResult<NodeView> {
    permissions::require_node_write(&user)?;
    let id = parse_id(&raw_id)?;

    let node = NodeService::new().await?.restore(id, &user).await?;
    Ok(ApiResponse::success(NodeView::flat(&node, &locale)))
}
