// handlers/public/auth/refresh.rs - POST /auth/refresh handler

use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::services::user_service::{RefreshInput, Session};
use crate::services::UserService;

/// POST /auth/refresh - trade a refresh token for a new pair.
/// Access tokens are rejected here with 401.
pub async fn refresh_post(ValidJson(input): ValidJson<RefreshInput>) -> ApiResult<Session> {
    let session = UserService::new()?.refresh(input).await?;
    Ok(ApiResponse::success(session))
}
