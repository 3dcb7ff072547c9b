use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::filter::TableSpec;

pub const SLEEP_SESSIONS: TableSpec = TableSpec {
    name: "sleep_sessions",
    columns: &["id", "user_id", "date", "hours", "quality", "created_at", "updated_at"],
    casts: &[
        ("id", "uuid"),
        ("user_id", "uuid"),
        ("date", "date"),
        ("created_at", "timestamptz"),
        ("updated_at", "timestamptz"),
    ],
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SleepSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub hours: f64,
    pub quality: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
