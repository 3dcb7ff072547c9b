use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::config;
use crate::database::manager::DatabaseError;
use crate::database::models::Badge;
use crate::filter::FilterData;
use crate::validation::{FieldErrors, Validate};

pub mod badge_service;
pub mod catalog_service;
pub mod exercise_service;
pub mod media;
pub mod meditation_service;
pub mod program_service;
pub mod sleep_service;
pub mod user_service;
pub mod world_service;

pub use badge_service::BadgeService;
pub use catalog_service::CatalogService;
pub use exercise_service::ExerciseService;
pub use media::{MediaResolver, ResolvedMedia, SoundCloudResolver};
pub use meditation_service::MeditationService;
pub use program_service::ProgramService;
pub use sleep_service::SleepService;
pub use user_service::UserService;
pub use world_service::WorldService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::from(err))
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        ServiceError::Invalid(errors)
    }
}

impl ServiceError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ServiceError::Invalid(FieldErrors::single(field, message))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// A logged session plus any badges it unlocked.
#[derive(Debug, Clone, Serialize)]
pub struct Logged<T: Serialize> {
    pub session: T,
    pub new_badges: Vec<Badge>,
}

pub const DEFAULT_SUMMARY_DAYS: i64 = 7;
pub const MAX_SUMMARY_DAYS: i64 = 365;

/// `?days=N` window for the summary endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<i64>,
}

impl SummaryQuery {
    pub fn days(&self) -> i64 {
        self.days.unwrap_or(DEFAULT_SUMMARY_DAYS)
    }
}

impl Validate for SummaryQuery {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(
            (1..=MAX_SUMMARY_DAYS).contains(&self.days()),
            "days",
            "must be between 1 and 365",
        );
        errors.into_result()
    }
}

/// First day of an N-day window that ends on `today` (inclusive).
pub fn window_start(days: i64, today: NaiveDate) -> NaiveDate {
    today - Duration::days(days.max(1) - 1)
}

/// `?from&to&limit&offset` for the per-user session lists.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl Validate for ListQuery {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let (Some(from), Some(to)) = (self.from, self.to) {
            errors.check(from <= to, "from", "must not be after to");
        }
        if let Some(limit) = self.limit {
            errors.check(limit >= 1, "limit", "must be positive");
        }
        if let Some(offset) = self.offset {
            errors.check(offset >= 0, "offset", "must not be negative");
        }
        errors.into_result()
    }
}

impl ListQuery {
    /// Filter for one user's rows, newest first. `to` is inclusive, so it
    /// becomes an exclusive bound on the following day. That works for both
    /// `date` and `timestamptz` columns.
    pub fn to_filter(&self, user_id: Uuid, column: &str) -> FilterData {
        let mut range = serde_json::Map::new();
        if let Some(from) = self.from {
            range.insert("$gte".into(), json!(from.to_string()));
        }
        if let Some(next) = self.to.and_then(|to| to.succ_opt()) {
            range.insert("$lt".into(), json!(next.to_string()));
        }

        let mut where_clause = serde_json::Map::new();
        where_clause.insert("user_id".into(), json!(user_id));
        if !range.is_empty() {
            where_clause.insert(column.to_string(), serde_json::Value::Object(range));
        }

        FilterData {
            where_clause: Some(serde_json::Value::Object(where_clause)),
            order: Some(json!(format!("{} desc, created_at desc", column))),
            limit: Some(self.limit.unwrap_or(config::config().api.default_page_size)),
            offset: self.offset,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn summary_days_default_and_bounds() {
        assert_eq!(SummaryQuery::default().days(), 7);
        assert!(SummaryQuery::default().validate().is_ok());
        assert!(SummaryQuery { days: Some(365) }.validate().is_ok());
        assert!(SummaryQuery { days: Some(0) }.validate().is_err());
        assert!(SummaryQuery { days: Some(366) }.validate().is_err());
    }

    #[test]
    fn window_includes_today() {
        let today = date("2025-03-10");
        assert_eq!(window_start(1, today), today);
        assert_eq!(window_start(7, today), date("2025-03-04"));
    }

    #[test]
    fn list_filter_makes_to_inclusive() {
        let user = Uuid::new_v4();
        let query = ListQuery {
            from: Some(date("2025-01-01")),
            to: Some(date("2025-01-31")),
            limit: Some(10),
            offset: None,
        };
        let filter = query.to_filter(user, "date");
        let where_clause = filter.where_clause.unwrap();
        assert_eq!(where_clause["user_id"], json!(user));
        assert_eq!(where_clause["date"]["$gte"], "2025-01-01");
        assert_eq!(where_clause["date"]["$lt"], "2025-02-01");
        assert_eq!(filter.limit, Some(10));
    }

    #[test]
    fn list_query_rejects_inverted_range() {
        let query = ListQuery {
            from: Some(date("2025-02-01")),
            to: Some(date("2025-01-01")),
            ..Default::default()
        };
        let errors = query.validate().unwrap_err();
        assert!(errors.get("from").is_some());
    }
}
