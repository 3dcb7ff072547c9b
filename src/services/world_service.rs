use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::EarnedBadge;

use super::exercise_service::ExerciseSummary;
use super::meditation_service::MeditationSummary;
use super::sleep_service::SleepSummary;
use super::{BadgeService, ExerciseService, MeditationService, ProgramService, ServiceResult, SleepService};

const RECENT_BADGES: i64 = 5;

/// Signed-in dashboard: every domain summary over the same window.
#[derive(Debug, Clone, Serialize)]
pub struct WorldOverview {
    pub days: i64,
    pub sleep: SleepSummary,
    pub meditation: MeditationSummary,
    pub exercise: ExerciseSummary,
    pub recent_badges: Vec<EarnedBadge>,
    pub active_programs: i64,
}

pub struct WorldService {
    pool: PgPool,
}

impl WorldService {
    pub fn new() -> ServiceResult<Self> {
        Ok(Self::with_pool(DatabaseManager::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn overview(&self, user_id: Uuid, days: i64) -> ServiceResult<WorldOverview> {
        let sleep = SleepService::with_pool(self.pool.clone());
        let meditation = MeditationService::with_pool(self.pool.clone());
        let exercise = ExerciseService::with_pool(self.pool.clone());
        let badges = BadgeService::with_pool(self.pool.clone());
        let programs = ProgramService::with_pool(self.pool.clone());

        let (sleep, meditation, exercise, recent_badges, active_programs) = futures::try_join!(
            sleep.summary(user_id, days),
            meditation.summary(user_id, days),
            exercise.summary(user_id, days),
            badges.earned(user_id, Some(RECENT_BADGES)),
            programs.active_count(user_id),
        )?;

        Ok(WorldOverview {
            days,
            sleep,
            meditation,
            exercise,
            recent_badges,
            active_programs,
        })
    }
}
