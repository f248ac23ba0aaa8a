// handlers/protected/users.rs - /api/users/* handlers
//
// Visibility and the role hierarchy are enforced in UserService; handlers
// only gate on the coarse read/write permission.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query,
    },
    Extension, Json,
};
use crate::api::{parse_id, Message, NodeView, PageParams, UserDetailView};
use crate::auth::permissions;
use crate::database::models::User;
use crate::locale::RequestLocale;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, Page};
use crate::services::user_service::{ChangePasswordRequest, CreateUserRequest, UpdateUserRequest, UserListParams};
use crate::services::{NodeService, UserService};

/// GET /api/users - Users visible to the caller, filtered, searched and ordered
pub async fn list(
    Extension(user): Extension<CurrentUser>,
    params: Result<Query<UserListParams>, QueryRejection>,
    page: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Page<User>> {
    permissions::require_read(&user)?;
    let Query(params) = params?;
    let Query(page) = page?;
    let (limit, offset) = page.resolve();

    let page = UserService::new().await?.list(&user, &params, limit, offset).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/users - Create a user (ADMIN or SUDO)
pub async fn create(
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    permissions::require_user_write(&user)?;
    let Json(request) = payload?;

    let created = UserService::new().await?.create(&user, request).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/users/:id - One visible user with audit extras
pub async fn get(Extension(user): Extension<CurrentUser>, Path(raw_id): Path<String>) -> ApiResult<UserDetailView> {
    permissions::require_read(&user)?;
    let id = parse_id(&raw_id)?;

    let (target, count) = UserService::new().await?.detail(&user, id).await?;
    Ok(ApiResponse::success(UserDetailView::new(target, count)))
}

/// PUT/PATCH /api/users/:id - Both merge the fields sent
pub async fn update(
    Extension(user): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    permissions::require_user_write(&user)?;
    let id = parse_id(&raw_id)?;
    let Json(request) = payload?;

    let updated = UserService::new().await?.update(&user, id, request).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/users/:id - Soft delete, 204 on success
pub async fn delete(Extension(user): Extension<CurrentUser>, Path(raw_id): Path<String>) -> ApiResult<()> {
    permissions::require_user_write(&user)?;
    let id = parse_id(&raw_id)?;

    UserService::new().await?.delete(&user, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/users/:id/nodes-created - Active nodes created by a user
pub async fn nodes_created(
    Extension(user): Extension<CurrentUser>,
    Extension(locale): Extension<RequestLocale>,
    Path(raw_id): Path<String>,
    page: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Page<NodeView>> {
    permissions::require_read(&user)?;
    let id = parse_id(&raw_id)?;
    let Query(page) = page?;
    let (limit, offset) = page.resolve();

    let target = UserService::new().await?.nodes_created_target(&user, id).await?;
    let page = NodeService::new().await?.created_by(target.id, limit, offset, &locale).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/users/me - The caller's own detail
pub async fn me(Extension(user): Extension<CurrentUser>) -> ApiResult<UserDetailView> {
    permissions::require_read(&user)?;

    let (me, count) = UserService::new().await?.me(&user).await?;
    Ok(ApiResponse::success(UserDetailView::new(me, count)))
}

/// PUT/PATCH /api/users/me/update - Edit own profile
pub async fn update_me(
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    permissions::require_read(&user)?;
    let Json(request) = payload?;

    let updated = UserService::new().await?.update_me(&user, request).await?;
    Ok(ApiResponse::success(updated))
}

/// POST /api/users/me/change-password
pub async fn change_password(
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Message> {
    permissions::require_read(&user)?;
    let Json(request) = payload?;

    UserService::new().await?.change_password(&user, request).await?;
    Ok(ApiResponse::success(Message::new("Password changed successfully.")))
}
