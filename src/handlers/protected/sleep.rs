// handlers/protected/sleep.rs - /api/sleep handlers

use uuid::Uuid;

use crate::database::models::SleepSession;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson, ValidPath, ValidQuery};
use crate::services::sleep_service::{SleepInput, SleepSummary};
use crate::services::{ListQuery, Logged, SleepService, SummaryQuery};

/**
 * POST /api/sleep - Record a night of sleep
 *
 * Expected Input:
 * ```json
 * { "date": "2025-03-09", "hours": 7.5, "quality": 4 }
 * ```
 *
 * Keyed by (user, date): submitting the same night again replaces hours and
 * quality, so offline retries are safe. Responds with the stored session and
 * any badges it unlocked.
 */
pub async fn sleep_post(user: AuthUser, ValidJson(input): ValidJson<SleepInput>) -> ApiResult<Logged<SleepSession>> {
    let logged = SleepService::new()?.upsert(user.id, input).await?;
    Ok(ApiResponse::created(logged))
}

/// GET /api/sleep?from&to&limit&offset - newest first
pub async fn sleep_list(user: AuthUser, ValidQuery(query): ValidQuery<ListQuery>) -> ApiResult<Vec<SleepSession>> {
    let sessions = SleepService::new()?.list(user.id, &query).await?;
    Ok(ApiResponse::success(sessions))
}

/// GET /api/sleep/:id
pub async fn sleep_get(user: AuthUser, ValidPath(id): ValidPath<Uuid>) -> ApiResult<SleepSession> {
    let session = SleepService::new()?.get(user.id, id).await?;
    Ok(ApiResponse::success(session))
}

/// DELETE /api/sleep/:id
pub async fn sleep_delete(user: AuthUser, ValidPath(id): ValidPath<Uuid>) -> ApiResult<()> {
    SleepService::new()?.delete(user.id, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/sleep/summary?days=N
pub async fn sleep_summary(user: AuthUser, ValidQuery(query): ValidQuery<SummaryQuery>) -> ApiResult<SleepSummary> {
    let summary = SleepService::new()?.summary(user.id, query.days()).await?;
    Ok(ApiResponse::success(summary))
}
