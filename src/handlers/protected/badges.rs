// handlers/protected/badges.rs - /api/badges handlers

use crate::database::models::{BadgeStatus, EarnedBadge};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::BadgeService;

/// GET /api/badges - full catalog with `earned` / `earned_at` for the caller
pub async fn badges_get(user: AuthUser) -> ApiResult<Vec<BadgeStatus>> {
    let badges = BadgeService::new()?.catalog(user.id).await?;
    Ok(ApiResponse::success(badges))
}

/// GET /api/badges/me - earned badges, newest first
pub async fn badges_me_get(user: AuthUser) -> ApiResult<Vec<EarnedBadge>> {
    let badges = BadgeService::new()?.earned(user.id, None).await?;
    Ok(ApiResponse::success(badges))
}
