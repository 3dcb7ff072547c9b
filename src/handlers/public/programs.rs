// handlers/public/programs.rs - Program catalog (no auth)

use uuid::Uuid;

use crate::database::models::Program;
use crate::middleware::{ApiResponse, ApiResult, ValidPath};
use crate::services::program_service::ProgramDetail;
use crate::services::ProgramService;

/// GET /programs
pub async fn programs_get() -> ApiResult<Vec<Program>> {
    let programs = ProgramService::new()?.list().await?;
    Ok(ApiResponse::success(programs))
}

/// GET /programs/:id - program with its ordered days
pub async fn program_get(ValidPath(id): ValidPath<Uuid>) -> ApiResult<ProgramDetail> {
    let program = ProgramService::new()?.get(id).await?;
    Ok(ApiResponse::success(program))
}
