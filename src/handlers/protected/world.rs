// handlers/protected/world.rs - GET /api/world/overview handler

use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidQuery};
use crate::services::world_service::WorldOverview;
use crate::services::{SummaryQuery, WorldService};

pub async fn overview_get(user: AuthUser, ValidQuery(query): ValidQuery<SummaryQuery>) -> ApiResult<WorldOverview> {
    let overview = WorldService::new()?.overview(user.id, query.days()).await?;
    Ok(ApiResponse::success(overview))
}
