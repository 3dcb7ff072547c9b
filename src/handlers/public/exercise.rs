// handlers/public/exercise.rs - GET /exercise/contents handler

use crate::database::models::ExerciseContent;
use crate::middleware::{ApiResponse, ApiResult, ValidQuery};
use crate::services::exercise_service::ExerciseContentQuery;
use crate::services::ExerciseService;

pub async fn contents_get(ValidQuery(query): ValidQuery<ExerciseContentQuery>) -> ApiResult<Vec<ExerciseContent>> {
    let contents = ExerciseService::new()?.list_contents(&query).await?;
    Ok(ApiResponse::success(contents))
}
