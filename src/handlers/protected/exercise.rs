// handlers/protected/exercise.rs - /api/exercise handlers

use uuid::Uuid;

use crate::database::models::ExerciseSession;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson, ValidPath, ValidQuery};
use crate::services::exercise_service::{ExerciseSessionInput, ExerciseSummary};
use crate::services::{ExerciseService, ListQuery, Logged, SummaryQuery};

pub async fn exercise_post(
    user: AuthUser,
    ValidJson(input): ValidJson<ExerciseSessionInput>,
) -> ApiResult<Logged<ExerciseSession>> {
    let logged = ExerciseService::new()?.log(user.id, input).await?;
    Ok(ApiResponse::created(logged))
}

pub async fn exercise_list(user: AuthUser, ValidQuery(query): ValidQuery<ListQuery>) -> ApiResult<Vec<ExerciseSession>> {
    let sessions = ExerciseService::new()?.list(user.id, &query).await?;
    Ok(ApiResponse::success(sessions))
}

pub async fn exercise_delete(user: AuthUser, ValidPath(id): ValidPath<Uuid>) -> ApiResult<()> {
    ExerciseService::new()?.delete(user.id, id).await?;
    Ok(ApiResponse::no_content())
}

pub async fn exercise_summary(
    user: AuthUser,
    ValidQuery(query): ValidQuery<SummaryQuery>,
) -> ApiResult<ExerciseSummary> {
    let summary = ExerciseService::new()?.summary(user.id, query.days()).await?;
    Ok(ApiResponse::success(summary))
}
