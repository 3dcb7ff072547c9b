// handlers/elevated/coach/catalog.rs - Category and resource authoring

use uuid::Uuid;

use crate::database::models::{CategoryTranslation, LocalizedResource};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson, ValidPath};
use crate::services::catalog_service::{
    CategoryDetail, CreateCategoryInput, CreateCategoryTranslationDto, CreateResourceInput,
};
use crate::services::CatalogService;

/// POST /api/coach/categories
pub async fn categories_post(ValidJson(input): ValidJson<CreateCategoryInput>) -> ApiResult<CategoryDetail> {
    let category = CatalogService::new()?.create_category(input).await?;
    Ok(ApiResponse::created(category))
}

/// POST /api/coach/categories/:id/translations - upserts the (category, locale) name
pub async fn category_translations_post(
    ValidPath(category_id): ValidPath<Uuid>,
    ValidJson(dto): ValidJson<CreateCategoryTranslationDto>,
) -> ApiResult<CategoryTranslation> {
    let translation = CatalogService::new()?.upsert_category_translation(category_id, dto).await?;
    Ok(ApiResponse::success(translation))
}

/// POST /api/coach/resources - needs at least one translation
pub async fn resources_post(
    author: AuthUser,
    ValidJson(input): ValidJson<CreateResourceInput>,
) -> ApiResult<LocalizedResource> {
    let resource = CatalogService::new()?.create_resource(author.id, input).await?;
    Ok(ApiResponse::created(resource))
}
