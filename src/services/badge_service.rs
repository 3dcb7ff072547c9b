use chrono::Utc;
use sqlx::{FromRow, PgPool};
use std::collections::{HashMap, HashSet};
use tracing::info;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Badge, BadgeStatus, EarnedBadge};
use crate::types::Metric;

use super::meditation_service::{current_streak, meditation_days};
use super::ServiceResult;

pub type MetricValues = HashMap<Metric, i64>;

#[derive(Debug, FromRow)]
struct CountRow {
    sleep_sessions: i64,
    meditation_sessions: i64,
    meditation_minutes: i64,
    exercise_sessions: i64,
    exercise_minutes: i64,
    programs_completed: i64,
}

/// Badges whose threshold is met and which the user does not hold yet.
/// Badges with a metric this build doesn't know are never awarded.
pub fn awardable<'a>(badges: &'a [Badge], metrics: &MetricValues, held: &HashSet<Uuid>) -> Vec<&'a Badge> {
    badges
        .iter()
        .filter(|b| !held.contains(&b.id))
        .filter(|b| {
            b.metric
                .parse::<Metric>()
                .ok()
                .and_then(|m| metrics.get(&m))
                .is_some_and(|value| *value >= i64::from(b.threshold))
        })
        .collect()
}

pub struct BadgeService {
    pool: PgPool,
}

impl BadgeService {
    pub fn new() -> ServiceResult<Self> {
        Ok(Self::with_pool(DatabaseManager::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn metrics(&self, user_id: Uuid) -> ServiceResult<MetricValues> {
        let counts = sqlx::query_as::<_, CountRow>(
            "SELECT
                (SELECT COUNT(*) FROM sleep_sessions WHERE user_id = $1) AS sleep_sessions,
                (SELECT COUNT(*) FROM meditation_sessions WHERE user_id = $1) AS meditation_sessions,
                (SELECT COALESCE(SUM(duration_minutes), 0)::bigint FROM meditation_sessions WHERE user_id = $1) AS meditation_minutes,
                (SELECT COUNT(*) FROM exercise_sessions WHERE user_id = $1) AS exercise_sessions,
                (SELECT COALESCE(SUM(duration_minutes), 0)::bigint FROM exercise_sessions WHERE user_id = $1) AS exercise_minutes,
                (SELECT COUNT(*) FROM user_programs WHERE user_id = $1 AND completed_at IS NOT NULL) AS programs_completed",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let days = meditation_days(&self.pool, user_id).await?;
        let streak = current_streak(&days, Utc::now().date_naive());

        Ok(HashMap::from([
            (Metric::SleepSessions, counts.sleep_sessions),
            (Metric::MeditationSessions, counts.meditation_sessions),
            (Metric::MeditationMinutes, counts.meditation_minutes),
            (Metric::MeditationStreakDays, streak),
            (Metric::ExerciseSessions, counts.exercise_sessions),
            (Metric::ExerciseMinutes, counts.exercise_minutes),
            (Metric::ProgramsCompleted, counts.programs_completed),
        ]))
    }

    /// Award every newly reached badge and return only those.
    pub async fn evaluate(&self, user_id: Uuid) -> ServiceResult<Vec<Badge>> {
        let badges = sqlx::query_as::<_, Badge>("SELECT id, slug, metric, threshold, icon FROM badges ORDER BY threshold, slug")
            .fetch_all(&self.pool)
            .await?;
        if badges.is_empty() {
            return Ok(vec![]);
        }

        let held: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>("SELECT badge_id FROM user_badges WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .collect();

        let metrics = self.metrics(user_id).await?;
        let mut awarded = Vec::new();
        for badge in awardable(&badges, &metrics, &held) {
            let result = sqlx::query(
                "INSERT INTO user_badges (user_id, badge_id) VALUES ($1, $2)
                 ON CONFLICT (user_id, badge_id) DO NOTHING",
            )
            .bind(user_id)
            .bind(badge.id)
            .execute(&self.pool)
            .await?;

            // a concurrent evaluation may have inserted it first
            if result.rows_affected() == 1 {
                info!("User {} earned badge {}", user_id, badge.slug);
                awarded.push(badge.clone());
            }
        }
        Ok(awarded)
    }

    pub async fn catalog(&self, user_id: Uuid) -> ServiceResult<Vec<BadgeStatus>> {
        let badges = sqlx::query_as::<_, BadgeStatus>(
            "SELECT b.id, b.slug, b.metric, b.threshold, b.icon,
                    (ub.badge_id IS NOT NULL) AS earned, ub.earned_at
             FROM badges b
             LEFT JOIN user_badges ub ON ub.badge_id = b.id AND ub.user_id = $1
             ORDER BY b.metric, b.threshold",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(badges)
    }

    pub async fn earned(&self, user_id: Uuid, limit: Option<i64>) -> ServiceResult<Vec<EarnedBadge>> {
        let badges = sqlx::query_as::<_, EarnedBadge>(
            "SELECT b.id, b.slug, b.metric, b.threshold, b.icon, ub.earned_at
             FROM user_badges ub
             JOIN badges b ON b.id = ub.badge_id
             WHERE ub.user_id = $1
             ORDER BY ub.earned_at DESC, b.slug
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(badges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(slug: &str, metric: &str, threshold: i32) -> Badge {
        Badge {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            metric: metric.to_string(),
            threshold,
            icon: None,
        }
    }

    #[test]
    fn awards_badges_at_threshold() {
        let badges = vec![
            badge("first-night", "sleep_sessions", 1),
            badge("sleep-week", "sleep_sessions", 7),
            badge("mindful-hour", "meditation_minutes", 60),
        ];
        let metrics = HashMap::from([(Metric::SleepSessions, 7), (Metric::MeditationMinutes, 59)]);

        let slugs: Vec<_> = awardable(&badges, &metrics, &HashSet::new()).iter().map(|b| b.slug.as_str()).collect();
        assert_eq!(slugs, vec!["first-night", "sleep-week"]);
    }

    #[test]
    fn held_badges_are_not_awarded_again() {
        let badges = vec![badge("first-night", "sleep_sessions", 1)];
        let metrics = HashMap::from([(Metric::SleepSessions, 3)]);
        let held = HashSet::from([badges[0].id]);
        assert!(awardable(&badges, &metrics, &held).is_empty());
    }

    #[test]
    fn unknown_or_missing_metrics_never_award() {
        let badges = vec![badge("steps", "daily_steps", 1), badge("finisher", "programs_completed", 1)];
        let metrics = HashMap::from([(Metric::SleepSessions, 100)]);
        assert!(awardable(&badges, &metrics, &HashSet::new()).is_empty());
    }
}
