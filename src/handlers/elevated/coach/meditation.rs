// handlers/elevated/coach/meditation.rs - POST /api/coach/meditation/contents handler

use crate::database::models::MeditationContent;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::services::meditation_service::CreateContentInput;
use crate::services::{MeditationService, SoundCloudResolver};

/**
 * POST /api/coach/meditation/contents - Publish meditation content
 *
 * Expected Input:
 * ```json
 * {
 *   "type_id": "uuid",
 *   "title": "Evening body scan",
 *   "mode": "audio",                                  // audio | timer | visual
 *   "duration_minutes": 15,
 *   "soundcloud_url": "https://soundcloud.com/...",   // Optional
 *   "media_url": "https://...",                       // Optional
 *   "is_premium": false, "sort_order": 0
 * }
 * ```
 *
 * A SoundCloud track is resolved to its player URL, which fills `media_url`
 * when none was given.
 */
pub async fn contents_post(
    coach: AuthUser,
    ValidJson(input): ValidJson<CreateContentInput>,
) -> ApiResult<MeditationContent> {
    let resolver = SoundCloudResolver::from_config();
    let content = MeditationService::new()?.create_content(coach.id, input, &resolver).await?;
    Ok(ApiResponse::created(content))
}
