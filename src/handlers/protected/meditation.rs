// handlers/protected/meditation.rs - /api/meditation handlers
//
// Guided breathing and mood check-ins are logged here too, as sessions with
// a mood before and after.

use uuid::Uuid;

use crate::database::models::MeditationSession;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson, ValidPath, ValidQuery};
use crate::services::meditation_service::{MeditationSessionInput, MeditationSummary};
use crate::services::{ListQuery, Logged, MeditationService, SummaryQuery};

/**
 * POST /api/meditation - Log a session
 *
 * Expected Input:
 * ```json
 * {
 *   "type_id": "uuid",                        // Required
 *   "content_id": "uuid",                     // Optional: must belong to type_id
 *   "started_at": "2025-03-09T21:00:00Z",     // Optional: defaults to now
 *   "duration_minutes": 10,                   // Required: 1..=600
 *   "mood_before": 2, "mood_after": 4         // Optional: 1..=5
 * }
 * ```
 */
pub async fn meditation_post(
    user: AuthUser,
    ValidJson(input): ValidJson<MeditationSessionInput>,
) -> ApiResult<Logged<MeditationSession>> {
    let logged = MeditationService::new()?.log(user.id, input).await?;
    Ok(ApiResponse::created(logged))
}

pub async fn meditation_list(
    user: AuthUser,
    ValidQuery(query): ValidQuery<ListQuery>,
) -> ApiResult<Vec<MeditationSession>> {
    let sessions = MeditationService::new()?.list(user.id, &query).await?;
    Ok(ApiResponse::success(sessions))
}

pub async fn meditation_delete(user: AuthUser, ValidPath(id): ValidPath<Uuid>) -> ApiResult<()> {
    MeditationService::new()?.delete(user.id, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/meditation/summary?days=N - totals, streak and average mood delta
pub async fn meditation_summary(
    user: AuthUser,
    ValidQuery(query): ValidQuery<SummaryQuery>,
) -> ApiResult<MeditationSummary> {
    let summary = MeditationService::new()?.summary(user.id, query.days()).await?;
    Ok(ApiResponse::success(summary))
}
