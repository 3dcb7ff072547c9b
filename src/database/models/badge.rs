use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Badge {
    pub id: Uuid,
    pub slug: String,
    pub metric: String,
    pub threshold: i32,
    pub icon: Option<String>,
}

/// Catalog badge joined with the caller's award, if any.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BadgeStatus {
    pub id: Uuid,
    pub slug: String,
    pub metric: String,
    pub threshold: i32,
    pub icon: Option<String>,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EarnedBadge {
    pub id: Uuid,
    pub slug: String,
    pub metric: String,
    pub threshold: i32,
    pub icon: Option<String>,
    pub earned_at: DateTime<Utc>,
}
