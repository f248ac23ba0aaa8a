// handlers/public/token.rs - POST /api/token/ and /api/token/refresh/

use axum::{extract::rejection::JsonRejection, Json};

use crate::auth::TokenPair;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::{LoginRequest, RefreshRequest};
use crate::services::UserService;

/// POST /api/token/ - Exchange username (or email) and password for a token pair
///
/// ```json
/// { "username": "admin_boss", "password": "..." }
/// ```
///
/// Inactive, unconfirmed and deleted accounts get the same 401 as a wrong
/// password.
pub async fn obtain(payload: Result<Json<LoginRequest>, JsonRejection>) -> ApiResult<TokenPair> {
    let Json(request) = payload?;
    let pair = UserService::new().await?.login(request).await?;
    Ok(ApiResponse::success(pair))
}

/// POST /api/token/refresh/ - Rotate a refresh token
pub async fn refresh(payload: Result<Json<RefreshRequest>, JsonRejection>) -> ApiResult<TokenPair> {
    let Json(request) = payload?;
    let pair = UserService::new().await?.refresh(request).await?;
    Ok(ApiResponse::success(pair))
}
