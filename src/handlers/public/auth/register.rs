// handlers/public/auth/register.rs - POST /auth/register handler

use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::services::user_service::{RegisterInput, Session};
use crate::services::UserService;

/**
 * POST /auth/register - Create an account and sign in
 *
 * Expected Input:
 * ```json
 * {
 *   "email": "ada@example.com",   // Required: trimmed and lowercased
 *   "password": "string",         // Required: min_password_length characters
 *   "display_name": "Ada",        // Optional: defaults to the email local part
 *   "locale": "fr"                // Optional: must be a supported locale
 * }
 * ```
 *
 * Responds 201 with `{ user, access_token, refresh_token, token_type, expires_in }`,
 * or 409 when the email is already registered.
 */
pub async fn register_post(ValidJson(input): ValidJson<RegisterInput>) -> ApiResult<Session> {
    let session = UserService::new()?.register(input).await?;
    Ok(ApiResponse::created(session))
}
