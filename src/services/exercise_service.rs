use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{ExerciseContent, ExerciseSession, EXERCISE_CONTENTS, EXERCISE_SESSIONS};
use crate::database::Repository;
use crate::filter::FilterData;
use crate::types::ExerciseKind;
use crate::validation::{FieldErrors, Validate};

use super::{window_start, BadgeService, ListQuery, Logged, ServiceError, ServiceResult};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExerciseContentQuery {
    pub kind: Option<ExerciseKind>,
}

impl Validate for ExerciseContentQuery {
    fn validate(&self) -> Result<(), FieldErrors> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExerciseContentInput {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: ExerciseKind,
    pub default_duration_minutes: i32,
}

impl Validate for CreateExerciseContentInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.slug("slug", &self.slug);
        errors.length("name", &self.name, 1, 120);
        errors.minutes("default_duration_minutes", self.default_duration_minutes);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseSessionInput {
    pub exercise_content_id: Uuid,
    pub date: NaiveDate,
    pub duration_minutes: i32,
    pub repetitions: Option<i32>,
    pub quality: Option<i16>,
}

impl Validate for ExerciseSessionInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.minutes("duration_minutes", self.duration_minutes);
        errors.score("quality", self.quality);
        errors.not_future("date", self.date);
        if let Some(reps) = self.repetitions {
            errors.check(reps >= 0, "repetitions", "must not be negative");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FrequentExercise {
    pub exercise_content_id: Uuid,
    pub name: String,
    pub sessions: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseSummary {
    pub days: i64,
    pub session_count: i64,
    pub total_minutes: i64,
    pub last_session_date: Option<NaiveDate>,
    pub most_frequent: Option<FrequentExercise>,
}

#[derive(Debug, FromRow)]
struct ExerciseAggregate {
    session_count: i64,
    total_minutes: i64,
    last_session_date: Option<NaiveDate>,
}

pub struct ExerciseService {
    pool: PgPool,
}

impl ExerciseService {
    pub fn new() -> ServiceResult<Self> {
        Ok(Self::with_pool(DatabaseManager::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_contents(&self, query: &ExerciseContentQuery) -> ServiceResult<Vec<ExerciseContent>> {
        let where_clause = match query.kind {
            Some(kind) => json!({ "kind": kind.as_str() }),
            None => json!({}),
        };
        let repo = Repository::<ExerciseContent>::new(EXERCISE_CONTENTS, self.pool.clone());
        let contents = repo
            .select_any(FilterData {
                where_clause: Some(where_clause),
                order: Some(json!("name asc")),
                ..Default::default()
            })
            .await?;
        Ok(contents)
    }

    pub async fn create_content(&self, input: CreateExerciseContentInput) -> ServiceResult<ExerciseContent> {
        let result = sqlx::query_as::<_, ExerciseContent>(
            "INSERT INTO exercise_contents (id, slug, name, description, kind, default_duration_minutes)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, slug, name, description, kind, default_duration_minutes",
        )
        .bind(Uuid::new_v4())
        .bind(&input.slug)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.kind.as_str())
        .bind(input.default_duration_minutes)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from);

        match result {
            Ok(content) => {
                info!("Created exercise content {}", content.slug);
                Ok(content)
            }
            Err(e) if e.is_unique_violation() => Err(ServiceError::Conflict(format!("Slug '{}' is already taken", input.slug))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn log(&self, user_id: Uuid, input: ExerciseSessionInput) -> ServiceResult<Logged<ExerciseSession>> {
        let result = sqlx::query_as::<_, ExerciseSession>(
            "INSERT INTO exercise_sessions
                (id, user_id, exercise_content_id, date, duration_minutes, repetitions, quality)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.exercise_content_id)
        .bind(input.date)
        .bind(input.duration_minutes)
        .bind(input.repetitions)
        .bind(input.quality)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from);

        let session = match result {
            Ok(session) => session,
            Err(e) if e.is_foreign_key_violation() => {
                return Err(ServiceError::invalid("exercise_content_id", "unknown exercise"));
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Recorded exercise {} for user {}", session.id, user_id);
        let new_badges = BadgeService::with_pool(self.pool.clone()).evaluate(user_id).await?;
        Ok(Logged { session, new_badges })
    }

    pub async fn list(&self, user_id: Uuid, query: &ListQuery) -> ServiceResult<Vec<ExerciseSession>> {
        let repo = Repository::<ExerciseSession>::new(EXERCISE_SESSIONS, self.pool.clone());
        Ok(repo.select_any(query.to_filter(user_id, "date")).await?)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ServiceResult<()> {
        let repo = Repository::<ExerciseSession>::new(EXERCISE_SESSIONS, self.pool.clone());
        if !repo.delete_owned(id, user_id).await? {
            return Err(ServiceError::NotFound("Exercise session not found".to_string()));
        }
        Ok(())
    }

    pub async fn summary(&self, user_id: Uuid, days: i64) -> ServiceResult<ExerciseSummary> {
        let since = window_start(days, Utc::now().date_naive());

        let aggregate = sqlx::query_as::<_, ExerciseAggregate>(
            "SELECT COUNT(*) AS session_count,
                    COALESCE(SUM(duration_minutes), 0)::bigint AS total_minutes,
                    MAX(date) AS last_session_date
             FROM exercise_sessions
             WHERE user_id = $1 AND date >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let most_frequent = sqlx::query_as::<_, FrequentExercise>(
            "SELECT s.exercise_content_id, c.name, COUNT(*) AS sessions
             FROM exercise_sessions s
             JOIN exercise_contents c ON c.id = s.exercise_content_id
             WHERE s.user_id = $1 AND s.date >= $2
             GROUP BY s.exercise_content_id, c.name
             ORDER BY sessions DESC, c.name
             LIMIT 1",
        )
        .bind(user_id)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ExerciseSummary {
            days,
            session_count: aggregate.session_count,
            total_minutes: aggregate.total_minutes,
            last_session_date: aggregate.last_session_date,
            most_frequent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_validation() {
        let input = ExerciseSessionInput {
            exercise_content_id: Uuid::new_v4(),
            date: Utc::now().date_naive(),
            duration_minutes: 0,
            repetitions: Some(-3),
            quality: Some(3),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.get("duration_minutes").is_some());
        assert!(errors.get("repetitions").is_some());
        assert!(errors.get("quality").is_none());
    }

    #[test]
    fn content_slug_must_be_kebab_case() {
        let input = CreateExerciseContentInput {
            slug: "Push Ups".into(),
            name: "Push-ups".into(),
            description: None,
            kind: ExerciseKind::Strength,
            default_duration_minutes: 10,
        };
        assert!(input.validate().unwrap_err().get("slug").is_some());
    }

    #[test]
    fn kind_parses_from_query_text() {
        let query: ExerciseContentQuery = serde_json::from_value(json!({ "kind": "breathing" })).unwrap();
        assert_eq!(query.kind, Some(ExerciseKind::Breathing));
    }
}
