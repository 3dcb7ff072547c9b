// handlers/elevated/coach/programs.rs - POST /api/coach/programs handler

use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::services::program_service::{CreateProgramInput, ProgramDetail};
use crate::services::ProgramService;

/**
 * POST /api/coach/programs - Create a program with its days
 *
 * Expected Input:
 * ```json
 * {
 *   "slug": "couch-to-5k",
 *   "title": "Couch to 5k",
 *   "kind": "workout",                 // workout | sleep | meditation
 *   "days": [
 *     { "day_number": 1, "title": "Walk", "exercise_content_id": "uuid", "duration_minutes": 20 }
 *   ]
 * }
 * ```
 *
 * Day numbers must be unique and contiguous from 1. Program and days are
 * written in one transaction.
 */
pub async fn programs_post(coach: AuthUser, ValidJson(input): ValidJson<CreateProgramInput>) -> ApiResult<ProgramDetail> {
    let program = ProgramService::new()?.create(coach.id, input).await?;
    Ok(ApiResponse::created(program))
}
