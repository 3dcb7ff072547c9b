// handlers/protected/media.rs - GET /api/media/soundcloud handler

use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidQuery};
use crate::services::media::validate_soundcloud_url;
use crate::services::{MediaResolver, ResolvedMedia, SoundCloudResolver};
use crate::validation::{FieldErrors, Validate};

#[derive(Debug, Deserialize)]
pub struct SoundCloudQuery {
    pub url: String,
}

impl Validate for SoundCloudQuery {
    fn validate(&self) -> Result<(), FieldErrors> {
        validate_soundcloud_url(&self.url)
            .map(|_| ())
            .map_err(|msg| FieldErrors::single("url", msg))
    }
}

/// Resolves a SoundCloud track into embed metadata. `data` is null when the
/// upstream lookup fails, so clients fall back to a plain link.
pub async fn soundcloud_get(
    _user: AuthUser,
    ValidQuery(query): ValidQuery<SoundCloudQuery>,
) -> ApiResult<Option<ResolvedMedia>> {
    let resolved = SoundCloudResolver::from_config().resolve(query.url.trim()).await;
    Ok(ApiResponse::success(resolved))
}
