// handlers/protected/programs.rs - Subscriptions and day completion

use uuid::Uuid;

use crate::database::models::UserProgram;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidPath};
use crate::services::program_service::{DayCompletion, Subscription, SubscriptionDetail};
use crate::services::ProgramService;

/// POST /api/programs/:id/subscribe - 409 while an active subscription exists
pub async fn subscribe_post(user: AuthUser, ValidPath(program_id): ValidPath<Uuid>) -> ApiResult<UserProgram> {
    let subscription = ProgramService::new()?.subscribe(user.id, program_id).await?;
    Ok(ApiResponse::created(subscription))
}

/// GET /api/user-programs - subscriptions with progress
pub async fn user_programs_get(user: AuthUser) -> ApiResult<Vec<Subscription>> {
    let subscriptions = ProgramService::new()?.subscriptions(user.id).await?;
    Ok(ApiResponse::success(subscriptions))
}

/// GET /api/user-programs/:id - per-day completion
pub async fn user_program_get(user: AuthUser, ValidPath(id): ValidPath<Uuid>) -> ApiResult<SubscriptionDetail> {
    let detail = ProgramService::new()?.subscription_detail(user.id, id).await?;
    Ok(ApiResponse::success(detail))
}

/// POST /api/user-programs/:id/days/:day/complete - idempotent
pub async fn day_complete_post(user: AuthUser, ValidPath((id, day)): ValidPath<(Uuid, i32)>) -> ApiResult<DayCompletion> {
    let completion = ProgramService::new()?.complete_day(user.id, id, day).await?;
    Ok(ApiResponse::success(completion))
}

/// DELETE /api/user-programs/:id - unsubscribe
pub async fn user_program_delete(user: AuthUser, ValidPath(id): ValidPath<Uuid>) -> ApiResult<()> {
    ProgramService::new()?.unsubscribe(user.id, id).await?;
    Ok(ApiResponse::no_content())
}
