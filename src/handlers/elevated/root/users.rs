// handlers/elevated/root/users.rs - PUT /api/root/users/:id/role handler

use uuid::Uuid;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson, ValidPath};
use crate::services::user_service::RoleInput;
use crate::services::UserService;

/**
 * PUT /api/root/users/:id/role - Grant or revoke a role
 *
 * Expected Input:
 * ```json
 * { "role": "coach" }   // user | coach | admin
 * ```
 *
 * The new role takes effect on the user's next token refresh.
 */
pub async fn user_role_put(
    admin: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<RoleInput>,
) -> ApiResult<User> {
    tracing::info!("Admin {} setting role of {} to {}", admin.id, id, input.role);
    let user = UserService::new()?.set_role(id, input.role).await?;
    Ok(ApiResponse::success(user))
}
