use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Badge, Program, ProgramDay, UserProgram, PROGRAMS, USER_PROGRAMS};
use crate::database::Repository;
use crate::filter::FilterData;
use crate::types::ProgramKind;
use crate::validation::{FieldErrors, Validate};

use super::{BadgeService, ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramDayInput {
    pub day_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub exercise_content_id: Option<Uuid>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgramInput {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub kind: ProgramKind,
    pub days: Vec<ProgramDayInput>,
}

/// Day numbers must be exactly 1..=n in some order.
pub fn days_are_contiguous(day_numbers: &[i32]) -> bool {
    let mut sorted = day_numbers.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(idx, n)| i64::from(*n) == idx as i64 + 1)
}

impl Validate for CreateProgramInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.slug("slug", &self.slug);
        errors.length("title", &self.title, 1, 200);
        if self.days.is_empty() {
            errors.add("days", "must contain at least one day");
        } else {
            let numbers: Vec<i32> = self.days.iter().map(|d| d.day_number).collect();
            errors.check(days_are_contiguous(&numbers), "days", "day numbers must be unique and contiguous from 1");
        }
        for (idx, day) in self.days.iter().enumerate() {
            errors.length(&format!("days[{}].title", idx), &day.title, 1, 200);
            if let Some(minutes) = day.duration_minutes {
                errors.minutes(&format!("days[{}].duration_minutes", idx), minutes);
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramDetail {
    #[serde(flatten)]
    pub program: Program,
    pub days: Vec<ProgramDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub completed_days: i64,
    pub total_days: i64,
    pub percent: u8,
}

impl Progress {
    pub fn new(completed_days: i64, total_days: i64) -> Self {
        let percent = if total_days <= 0 {
            0
        } else {
            ((completed_days.clamp(0, total_days) * 100) / total_days) as u8
        };
        Self {
            completed_days,
            total_days,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_days > 0 && self.completed_days >= self.total_days
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    program_id: Uuid,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    program_slug: String,
    program_title: String,
    completed_days: i64,
    total_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    #[serde(flatten)]
    pub subscription: UserProgram,
    pub program_slug: String,
    pub program_title: String,
    pub progress: Progress,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            subscription: UserProgram {
                id: row.id,
                user_id: row.user_id,
                program_id: row.program_id,
                started_at: row.started_at,
                completed_at: row.completed_at,
            },
            program_slug: row.program_slug,
            program_title: row.program_title,
            progress: Progress::new(row.completed_days, row.total_days),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DayProgress {
    pub day_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub exercise_content_id: Option<Uuid>,
    pub duration_minutes: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDetail {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub days: Vec<DayProgress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCompletion {
    pub subscription: UserProgram,
    pub progress: Progress,
    pub new_badges: Vec<Badge>,
}

const SUBSCRIPTION_SELECT: &str = "SELECT up.id, up.user_id, up.program_id, up.started_at, up.completed_at,
        p.slug AS program_slug, p.title AS program_title,
        (SELECT COUNT(*) FROM user_program_days ud WHERE ud.user_program_id = up.id) AS completed_days,
        (SELECT COUNT(*) FROM program_days d WHERE d.program_id = up.program_id) AS total_days
     FROM user_programs up
     JOIN programs p ON p.id = up.program_id";

pub struct ProgramService {
    pool: PgPool,
}

impl ProgramService {
    pub fn new() -> ServiceResult<Self> {
        Ok(Self::with_pool(DatabaseManager::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Program>> {
        let repo = Repository::<Program>::new(PROGRAMS, self.pool.clone());
        let programs = repo
            .select_any(FilterData {
                order: Some(json!("title asc")),
                ..Default::default()
            })
            .await?;
        Ok(programs)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<ProgramDetail> {
        let repo = Repository::<Program>::new(PROGRAMS, self.pool.clone());
        let program = repo
            .select_one(FilterData {
                where_clause: Some(json!({ "id": id })),
                ..Default::default()
            })
            .await?
            .ok_or_else(|| ServiceError::NotFound("Program not found".to_string()))?;

        let days = sqlx::query_as::<_, ProgramDay>(
            "SELECT program_id, day_number, title, description, exercise_content_id, duration_minutes
             FROM program_days WHERE program_id = $1 ORDER BY day_number",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ProgramDetail { program, days })
    }

    /// Creates the program and all of its days atomically.
    pub async fn create(&self, author_id: Uuid, input: CreateProgramInput) -> ServiceResult<ProgramDetail> {
        let mut tx = self.pool.begin().await?;

        let program = sqlx::query_as::<_, Program>(
            "INSERT INTO programs (id, slug, title, description, kind, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, slug, title, description, kind, created_by, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&input.slug)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.kind.as_str())
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &input.slug))?;

        let mut days = Vec::with_capacity(input.days.len());
        let mut inputs = input.days;
        inputs.sort_by_key(|d| d.day_number);
        for day in inputs {
            let row = sqlx::query_as::<_, ProgramDay>(
                "INSERT INTO program_days (program_id, day_number, title, description, exercise_content_id, duration_minutes)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING program_id, day_number, title, description, exercise_content_id, duration_minutes",
            )
            .bind(program.id)
            .bind(day.day_number)
            .bind(day.title.trim())
            .bind(&day.description)
            .bind(day.exercise_content_id)
            .bind(day.duration_minutes)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, &input.slug))?;
            days.push(row);
        }

        tx.commit().await?;
        info!("Coach {} created program {} with {} days", author_id, program.slug, days.len());
        Ok(ProgramDetail { program, days })
    }

    pub async fn subscribe(&self, user_id: Uuid, program_id: Uuid) -> ServiceResult<UserProgram> {
        // 404 before 409 so a bad id never reads as "already subscribed"
        self.get(program_id).await?;

        let result = sqlx::query_as::<_, UserProgram>(
            "INSERT INTO user_programs (id, user_id, program_id) VALUES ($1, $2, $3)
             RETURNING id, user_id, program_id, started_at, completed_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(program_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from);

        match result {
            Ok(subscription) => {
                info!("User {} subscribed to program {}", user_id, program_id);
                Ok(subscription)
            }
            Err(e) if e.is_unique_violation() => {
                Err(ServiceError::Conflict("Already subscribed to this program".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn subscriptions(&self, user_id: Uuid) -> ServiceResult<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "{} WHERE up.user_id = $1 ORDER BY up.started_at DESC",
            SUBSCRIPTION_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Subscription::from).collect())
    }

    async fn subscription(&self, user_id: Uuid, id: Uuid) -> ServiceResult<Subscription> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "{} WHERE up.user_id = $1 AND up.id = $2",
            SUBSCRIPTION_SELECT
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Subscription not found".to_string()))?;
        Ok(row.into())
    }

    pub async fn subscription_detail(&self, user_id: Uuid, id: Uuid) -> ServiceResult<SubscriptionDetail> {
        let subscription = self.subscription(user_id, id).await?;
        let days = sqlx::query_as::<_, DayProgress>(
            "SELECT d.day_number, d.title, d.description, d.exercise_content_id, d.duration_minutes, ud.completed_at
             FROM program_days d
             LEFT JOIN user_program_days ud ON ud.user_program_id = $1 AND ud.day_number = d.day_number
             WHERE d.program_id = $2
             ORDER BY d.day_number",
        )
        .bind(id)
        .bind(subscription.subscription.program_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SubscriptionDetail { subscription, days })
    }

    pub async fn active_count(&self, user_id: Uuid) -> ServiceResult<i64> {
        let repo = Repository::<UserProgram>::new(USER_PROGRAMS, self.pool.clone());
        let count = repo
            .count(FilterData {
                where_clause: Some(json!({ "user_id": user_id, "completed_at": { "$null": true } })),
                ..Default::default()
            })
            .await?;
        Ok(count)
    }

    /// Marks a day done. Repeating it is a no-op. Finishing the last day
    /// completes the subscription and re-evaluates badges.
    pub async fn complete_day(&self, user_id: Uuid, id: Uuid, day_number: i32) -> ServiceResult<DayCompletion> {
        let mut tx = self.pool.begin().await?;

        let subscription = sqlx::query_as::<_, UserProgram>(
            "SELECT id, user_id, program_id, started_at, completed_at
             FROM user_programs WHERE id = $1 AND user_id = $2
             FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Subscription not found".to_string()))?;

        let day_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM program_days WHERE program_id = $1 AND day_number = $2)",
        )
        .bind(subscription.program_id)
        .bind(day_number)
        .fetch_one(&mut *tx)
        .await?;
        if !day_exists {
            return Err(ServiceError::NotFound(format!("Day {} is not part of this program", day_number)));
        }

        sqlx::query(
            "INSERT INTO user_program_days (user_program_id, day_number) VALUES ($1, $2)
             ON CONFLICT (user_program_id, day_number) DO NOTHING",
        )
        .bind(id)
        .bind(day_number)
        .execute(&mut *tx)
        .await?;

        let (completed, total): (i64, i64) = sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM user_program_days WHERE user_program_id = $1),
                (SELECT COUNT(*) FROM program_days WHERE program_id = $2)",
        )
        .bind(id)
        .bind(subscription.program_id)
        .fetch_one(&mut *tx)
        .await?;
        let progress = Progress::new(completed, total);

        let mut subscription = subscription;
        let just_finished = progress.is_complete() && subscription.completed_at.is_none();
        if just_finished {
            subscription = sqlx::query_as::<_, UserProgram>(
                "UPDATE user_programs SET completed_at = now() WHERE id = $1
                 RETURNING id, user_id, program_id, started_at, completed_at",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let new_badges = if just_finished {
            info!("User {} completed program {}", user_id, subscription.program_id);
            BadgeService::with_pool(self.pool.clone()).evaluate(user_id).await?
        } else {
            vec![]
        };

        Ok(DayCompletion {
            subscription,
            progress,
            new_badges,
        })
    }

    pub async fn unsubscribe(&self, user_id: Uuid, id: Uuid) -> ServiceResult<()> {
        let repo = Repository::<UserProgram>::new(USER_PROGRAMS, self.pool.clone());
        if !repo.delete_owned(id, user_id).await? {
            return Err(ServiceError::NotFound("Subscription not found".to_string()));
        }
        Ok(())
    }
}

fn map_write_error(err: sqlx::Error, slug: &str) -> ServiceError {
    let err = DatabaseError::from(err);
    if err.is_unique_violation() {
        ServiceError::Conflict(format!("Slug '{}' is already taken", slug))
    } else if err.is_foreign_key_violation() {
        ServiceError::invalid("days", "references an unknown exercise")
    } else {
        err.into()
    }
}
