// handlers/public/meditation.rs - Meditation catalog (no auth)

use crate::database::models::{MeditationContent, MeditationType};
use crate::middleware::{ApiResponse, ApiResult, RequestLocale, ValidQuery};
use crate::services::meditation_service::ContentQuery;
use crate::services::MeditationService;

/// GET /meditation/types?lang= - active types, localized
pub async fn types_get(locale: RequestLocale) -> ApiResult<Vec<MeditationType>> {
    let types = MeditationService::new()?.list_types(locale.as_str()).await?;
    Ok(ApiResponse::success(types))
}

/// GET /meditation/contents?type_id&duration_min&duration_max&mode&premium
pub async fn contents_get(ValidQuery(query): ValidQuery<ContentQuery>) -> ApiResult<Vec<MeditationContent>> {
    let contents = MeditationService::new()?.list_contents(&query).await?;
    Ok(ApiResponse::success(contents))
}
