use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{
    MeditationContent, MeditationSession, MeditationType, MEDITATION_CONTENTS, MEDITATION_SESSIONS,
};
use crate::database::Repository;
use crate::filter::FilterData;
use crate::i18n;
use crate::types::MeditationMode;
use crate::validation::{FieldErrors, Validate};

use super::media::{validate_soundcloud_url, MediaResolver};
use super::{window_start, BadgeService, ListQuery, Logged, ServiceError, ServiceResult};

/// Public content filter (`GET /meditation/contents`).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ContentQuery {
    pub type_id: Option<Uuid>,
    pub duration_min: Option<i32>,
    pub duration_max: Option<i32>,
    pub mode: Option<MeditationMode>,
    pub premium: Option<bool>,
}

impl Validate for ContentQuery {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(min) = self.duration_min {
            errors.check(min >= 0, "duration_min", "must not be negative");
        }
        if let Some(max) = self.duration_max {
            errors.check(max >= 0, "duration_max", "must not be negative");
        }
        if let (Some(min), Some(max)) = (self.duration_min, self.duration_max) {
            errors.check(min <= max, "duration_min", "must not exceed duration_max");
        }
        errors.into_result()
    }
}

impl ContentQuery {
    pub fn to_filter(&self) -> FilterData {
        let mut where_clause = serde_json::Map::new();
        where_clause.insert("is_active".into(), json!(true));
        if let Some(type_id) = self.type_id {
            where_clause.insert("type_id".into(), json!(type_id));
        }
        let mut duration = serde_json::Map::new();
        if let Some(min) = self.duration_min {
            duration.insert("$gte".into(), json!(min));
        }
        if let Some(max) = self.duration_max {
            duration.insert("$lte".into(), json!(max));
        }
        if !duration.is_empty() {
            where_clause.insert("duration_minutes".into(), serde_json::Value::Object(duration));
        }
        if let Some(mode) = self.mode {
            where_clause.insert("mode".into(), json!(mode.as_str()));
        }
        if let Some(premium) = self.premium {
            where_clause.insert("is_premium".into(), json!(premium));
        }

        FilterData {
            where_clause: Some(serde_json::Value::Object(where_clause)),
            order: Some(json!(["sort_order asc", "title asc"])),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContentInput {
    pub type_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub mode: MeditationMode,
    pub duration_minutes: i32,
    pub media_url: Option<String>,
    pub soundcloud_url: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl Validate for CreateContentInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.length("title", &self.title, 1, 200);
        errors.minutes("duration_minutes", self.duration_minutes);
        if let Some(url) = &self.soundcloud_url {
            if let Err(msg) = validate_soundcloud_url(url) {
                errors.add("soundcloud_url", msg);
            }
        }
        if let Some(url) = &self.media_url {
            errors.check(url::Url::parse(url).is_ok(), "media_url", "must be a valid URL");
        }
        errors.into_result()
    }
}

/// A meditation session, including guided breathing and mood check-ins.
#[derive(Debug, Clone, Deserialize)]
pub struct MeditationSessionInput {
    pub type_id: Uuid,
    pub content_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
    pub mood_before: Option<i16>,
    pub mood_after: Option<i16>,
}

impl Validate for MeditationSessionInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.minutes("duration_minutes", self.duration_minutes);
        errors.score("mood_before", self.mood_before);
        errors.score("mood_after", self.mood_after);
        if let Some(started_at) = self.started_at {
            errors.not_future("started_at", started_at.date_naive());
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MeditationSummary {
    pub days: i64,
    pub session_count: i64,
    pub total_minutes: i64,
    pub current_streak_days: i64,
    pub average_mood_delta: Option<f64>,
}

#[derive(Debug, FromRow)]
struct MeditationAggregate {
    session_count: i64,
    total_minutes: i64,
    average_mood_delta: Option<f64>,
}

/// Consecutive days with a session, ending today or yesterday.
/// `days` must be distinct and sorted newest first.
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> i64 {
    let Some(&latest) = days.first() else {
        return 0;
    };
    if latest != today && latest != today - Duration::days(1) {
        return 0;
    }

    let mut streak = 0;
    let mut expected = latest;
    for day in days {
        if *day != expected {
            break;
        }
        streak += 1;
        expected = expected - Duration::days(1);
    }
    streak
}

/// Distinct UTC days with at least one session, newest first.
pub async fn meditation_days(pool: &PgPool, user_id: Uuid) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        "SELECT DISTINCT (started_at AT TIME ZONE 'UTC')::date AS day
         FROM meditation_sessions
         WHERE user_id = $1
         ORDER BY day DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub struct MeditationService {
    pool: PgPool,
}

impl MeditationService {
    pub fn new() -> ServiceResult<Self> {
        Ok(Self::with_pool(DatabaseManager::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active types with names in `locale`, falling back to the default locale.
    pub async fn list_types(&self, locale: &str) -> ServiceResult<Vec<MeditationType>> {
        let types = sqlx::query_as::<_, MeditationType>(
            "SELECT t.id, t.slug,
                    COALESCE(tr.name, dtr.name, t.slug) AS name,
                    COALESCE(tr.description, dtr.description) AS description,
                    t.default_duration_minutes, t.sort_order
             FROM meditation_types t
             LEFT JOIN meditation_type_translations tr ON tr.type_id = t.id AND tr.locale = $1
             LEFT JOIN meditation_type_translations dtr ON dtr.type_id = t.id AND dtr.locale = $2
             WHERE t.is_active
             ORDER BY t.sort_order, t.slug",
        )
        .bind(locale)
        .bind(i18n::default_locale())
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    pub async fn list_contents(&self, query: &ContentQuery) -> ServiceResult<Vec<MeditationContent>> {
        let repo = Repository::<MeditationContent>::new(MEDITATION_CONTENTS, self.pool.clone());
        Ok(repo.select_any(query.to_filter()).await?)
    }

    async fn type_exists(&self, type_id: Uuid) -> ServiceResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM meditation_types WHERE id = $1)")
            .bind(type_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn create_content(
        &self,
        author_id: Uuid,
        input: CreateContentInput,
        resolver: &dyn MediaResolver,
    ) -> ServiceResult<MeditationContent> {
        if !self.type_exists(input.type_id).await? {
            return Err(ServiceError::invalid("type_id", "unknown meditation type"));
        }

        let mut media_url = input.media_url;
        if let (Some(track), None) = (&input.soundcloud_url, &media_url) {
            media_url = resolver.resolve(track).await.and_then(|m| m.embed_url);
        }

        let content = sqlx::query_as::<_, MeditationContent>(
            "INSERT INTO meditation_contents
                (id, type_id, title, description, mode, duration_minutes, media_url, soundcloud_url,
                 is_premium, sort_order, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(input.type_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.mode.as_str())
        .bind(input.duration_minutes)
        .bind(&media_url)
        .bind(&input.soundcloud_url)
        .bind(input.is_premium)
        .bind(input.sort_order)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        info!("Coach {} created meditation content {}", author_id, content.id);
        Ok(content)
    }

    pub async fn log(&self, user_id: Uuid, input: MeditationSessionInput) -> ServiceResult<Logged<MeditationSession>> {
        if !self.type_exists(input.type_id).await? {
            return Err(ServiceError::invalid("type_id", "unknown meditation type"));
        }
        if let Some(content_id) = input.content_id {
            let content_type = sqlx::query_scalar::<_, Uuid>("SELECT type_id FROM meditation_contents WHERE id = $1")
                .bind(content_id)
                .fetch_optional(&self.pool)
                .await?;
            if content_type != Some(input.type_id) {
                return Err(ServiceError::invalid("content_id", "does not belong to the given meditation type"));
            }
        }

        let session = sqlx::query_as::<_, MeditationSession>(
            "INSERT INTO meditation_sessions
                (id, user_id, type_id, content_id, started_at, duration_minutes, mood_before, mood_after)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.type_id)
        .bind(input.content_id)
        .bind(input.started_at.unwrap_or_else(Utc::now))
        .bind(input.duration_minutes)
        .bind(input.mood_before)
        .bind(input.mood_after)
        .fetch_one(&self.pool)
        .await?;

        debug!("Recorded meditation {} for user {}", session.id, user_id);
        let new_badges = BadgeService::with_pool(self.pool.clone()).evaluate(user_id).await?;
        Ok(Logged { session, new_badges })
    }

    pub async fn list(&self, user_id: Uuid, query: &ListQuery) -> ServiceResult<Vec<MeditationSession>> {
        let repo = Repository::<MeditationSession>::new(MEDITATION_SESSIONS, self.pool.clone());
        Ok(repo.select_any(query.to_filter(user_id, "started_at")).await?)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ServiceResult<()> {
        let repo = Repository::<MeditationSession>::new(MEDITATION_SESSIONS, self.pool.clone());
        if !repo.delete_owned(id, user_id).await? {
            return Err(ServiceError::NotFound("Meditation session not found".to_string()));
        }
        Ok(())
    }

    pub async fn summary(&self, user_id: Uuid, days: i64) -> ServiceResult<MeditationSummary> {
        let today = Utc::now().date_naive();
        let since = window_start(days, today);

        let aggregate = sqlx::query_as::<_, MeditationAggregate>(
            "SELECT COUNT(*) AS session_count,
                    COALESCE(SUM(duration_minutes), 0)::bigint AS total_minutes,
                    (AVG(mood_after - mood_before)
                        FILTER (WHERE mood_before IS NOT NULL AND mood_after IS NOT NULL))::float8 AS average_mood_delta
             FROM meditation_sessions
             WHERE user_id = $1 AND started_at >= $2::date",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let days_with_sessions = meditation_days(&self.pool, user_id).await?;

        Ok(MeditationSummary {
            days,
            session_count: aggregate.session_count,
            total_minutes: aggregate.total_minutes,
            current_streak_days: current_streak(&days_with_sessions, today),
            average_mood_delta: aggregate.average_mood_delta,
        })
    }
}
