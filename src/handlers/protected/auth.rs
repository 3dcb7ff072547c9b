// handlers/protected/auth.rs - Current account

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::services::user_service::{Session, UpdateMeInput};
use crate::services::UserService;

/// GET /api/auth/whoami - the signed-in user, without credentials
pub async fn whoami_get(user: AuthUser) -> ApiResult<User> {
    let user = UserService::new()?.get(user.id).await?;
    Ok(ApiResponse::success(user))
}

/**
 * PATCH /api/users/me - Update profile fields
 *
 * Expected Input:
 * ```json
 * { "display_name": "Ada", "locale": "fr" }   // both optional
 * ```
 *
 * Returns the user with a fresh token pair so the new locale is carried by
 * subsequent requests.
 */
pub async fn me_patch(user: AuthUser, ValidJson(input): ValidJson<UpdateMeInput>) -> ApiResult<Session> {
    let session = UserService::new()?.update_me(user.id, input).await?;
    Ok(ApiResponse::success(session))
}

/// DELETE /api/users/me - removes the account and everything it owns
pub async fn me_delete(user: AuthUser) -> ApiResult<()> {
    UserService::new()?.delete(user.id).await?;
    Ok(ApiResponse::no_content())
}
