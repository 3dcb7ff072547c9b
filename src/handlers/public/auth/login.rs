// handlers/public/auth/login.rs - POST /auth/login handler

use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::services::user_service::{LoginInput, Session};
use crate::services::UserService;

/**
 * POST /auth/login - Exchange credentials for a token pair
 *
 * Expected Input:
 * ```json
 * { "email": "ada@example.com", "password": "string" }
 * ```
 *
 * Unknown emails and wrong passwords both answer 401 "Invalid credentials".
 */
pub async fn login_post(ValidJson(input): ValidJson<LoginInput>) -> ApiResult<Session> {
    let session = UserService::new()?.login(input).await?;
    Ok(ApiResponse::success(session))
}
