use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{SleepSession, SLEEP_SESSIONS};
use crate::database::Repository;
use crate::validation::{FieldErrors, Validate};

use super::{window_start, BadgeService, ListQuery, Logged, ServiceError, ServiceResult};

/// One night of sleep as submitted by a client (also the offline queue payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepInput {
    pub date: NaiveDate,
    pub hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<i16>,
}

impl Validate for SleepInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(
            self.hours.is_finite() && self.hours > 0.0 && self.hours <= 24.0,
            "hours",
            "must be greater than 0 and at most 24",
        );
        errors.score("quality", self.quality);
        errors.not_future("date", self.date);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SleepSummary {
    pub days: i64,
    pub session_count: i64,
    pub average_hours: Option<f64>,
    pub average_quality: Option<f64>,
    pub last_night: Option<SleepSession>,
}

#[derive(Debug, FromRow)]
struct SleepAggregate {
    session_count: i64,
    average_hours: Option<f64>,
    average_quality: Option<f64>,
}

pub struct SleepService {
    pool: PgPool,
}

impl SleepService {
    pub fn new() -> ServiceResult<Self> {
        Ok(Self::with_pool(DatabaseManager::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self) -> Repository<SleepSession> {
        Repository::new(SLEEP_SESSIONS, self.pool.clone())
    }

    /// Insert or replace the user's session for `input.date`.
    pub async fn upsert(&self, user_id: Uuid, input: SleepInput) -> ServiceResult<Logged<SleepSession>> {
        let session = sqlx::query_as::<_, SleepSession>(
            "INSERT INTO sleep_sessions (id, user_id, date, hours, quality)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, date) DO UPDATE
                SET hours = EXCLUDED.hours, quality = EXCLUDED.quality, updated_at = now()
             RETURNING id, user_id, date, hours, quality, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.date)
        .bind(input.hours)
        .bind(input.quality)
        .fetch_one(&self.pool)
        .await?;

        debug!("Recorded sleep {} for user {} on {}", session.id, user_id, session.date);
        let new_badges = BadgeService::with_pool(self.pool.clone()).evaluate(user_id).await?;
        Ok(Logged { session, new_badges })
    }

    pub async fn list(&self, user_id: Uuid, query: &ListQuery) -> ServiceResult<Vec<SleepSession>> {
        Ok(self.repository().select_any(query.to_filter(user_id, "date")).await?)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ServiceResult<SleepSession> {
        Ok(self.repository().select_owned(id, user_id).await?)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ServiceResult<()> {
        if !self.repository().delete_owned(id, user_id).await? {
            return Err(ServiceError::NotFound("Sleep session not found".to_string()));
        }
        Ok(())
    }

    pub async fn summary(&self, user_id: Uuid, days: i64) -> ServiceResult<SleepSummary> {
        let since = window_start(days, Utc::now().date_naive());

        let aggregate = sqlx::query_as::<_, SleepAggregate>(
            "SELECT COUNT(*) AS session_count,
                    AVG(hours)::float8 AS average_hours,
                    AVG(quality)::float8 AS average_quality
             FROM sleep_sessions
             WHERE user_id = $1 AND date >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let last_night = sqlx::query_as::<_, SleepSession>(
            "SELECT id, user_id, date, hours, quality, created_at, updated_at
             FROM sleep_sessions
             WHERE user_id = $1 AND date >= $2
             ORDER BY date DESC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        Ok(SleepSummary {
            days,
            session_count: aggregate.session_count,
            average_hours: aggregate.average_hours,
            average_quality: aggregate.average_quality,
            last_night,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input(hours: f64, quality: Option<i16>) -> SleepInput {
        SleepInput { date: Utc::now().date_naive(), hours, quality }
    }

    #[test]
    fn hours_must_be_within_a_day() {
        assert!(input(7.5, Some(4)).validate().is_ok());
        assert!(input(24.0, None).validate().is_ok());
        assert!(input(0.0, None).validate().is_err());
        assert!(input(24.5, None).validate().is_err());
        assert!(input(f64::NAN, None).validate().is_err());
    }

    #[test]
    fn quality_is_optional_but_bounded() {
        let errors = input(8.0, Some(0)).validate().unwrap_err();
        assert!(errors.get("quality").is_some());
    }

    #[test]
    fn tomorrow_is_tolerated_but_not_later() {
        let today = Utc::now().date_naive();
        let tomorrow = SleepInput { date: today + Duration::days(1), hours: 7.0, quality: None };
        let later = SleepInput { date: today + Duration::days(3), hours: 7.0, quality: None };
        assert!(tomorrow.validate().is_ok());
        assert!(later.validate().unwrap_err().get("date").is_some());
    }

    #[test]
    fn quality_is_omitted_from_json_when_absent() {
        let json = serde_json::to_value(input(8.0, None)).unwrap();
        assert!(json.get("quality").is_none());
    }
}
