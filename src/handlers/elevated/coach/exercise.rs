// handlers/elevated/coach/exercise.rs - POST /api/coach/exercise/contents handler

use crate::database::models::ExerciseContent;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::services::exercise_service::CreateExerciseContentInput;
use crate::services::ExerciseService;

/// 409 when the slug is taken
pub async fn contents_post(ValidJson(input): ValidJson<CreateExerciseContentInput>) -> ApiResult<ExerciseContent> {
    let content = ExerciseService::new()?.create_content(input).await?;
    Ok(ApiResponse::created(content))
}
