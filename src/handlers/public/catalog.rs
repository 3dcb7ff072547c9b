// handlers/public/catalog.rs - Categories and resources (no auth)

use crate::database::models::{LocalizedCategory, LocalizedResource};
use crate::middleware::{ApiResponse, ApiResult, RequestLocale, ValidPath, ValidQuery};
use crate::services::catalog_service::ResourceQuery;
use crate::services::CatalogService;

/// GET /categories?lang= - names fall back to the default locale, then the slug
pub async fn categories_get(locale: RequestLocale) -> ApiResult<Vec<LocalizedCategory>> {
    let categories = CatalogService::new()?.list_categories(locale.as_str()).await?;
    Ok(ApiResponse::success(categories))
}

/// GET /resources?category&lang&q - `q` matches the localized title, case-insensitively
pub async fn resources_get(
    locale: RequestLocale,
    ValidQuery(query): ValidQuery<ResourceQuery>,
) -> ApiResult<Vec<LocalizedResource>> {
    let resources = CatalogService::new()?.list_resources(&query, locale.as_str()).await?;
    Ok(ApiResponse::success(resources))
}

/// GET /resources/:slug?lang=
pub async fn resource_get(locale: RequestLocale, ValidPath(slug): ValidPath<String>) -> ApiResult<LocalizedResource> {
    let resource = CatalogService::new()?.get_resource(&slug, locale.as_str()).await?;
    Ok(ApiResponse::success(resource))
}
