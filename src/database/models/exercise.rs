use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::filter::TableSpec;

pub const EXERCISE_CONTENTS: TableSpec = TableSpec {
    name: "exercise_contents",
    columns: &["id", "slug", "name", "description", "kind", "default_duration_minutes"],
    casts: &[("id", "uuid")],
};

pub const EXERCISE_SESSIONS: TableSpec = TableSpec {
    name: "exercise_sessions",
    columns: &[
        "id",
        "user_id",
        "exercise_content_id",
        "date",
        "duration_minutes",
        "repetitions",
        "quality",
        "created_at",
    ],
    casts: &[
        ("id", "uuid"),
        ("user_id", "uuid"),
        ("exercise_content_id", "uuid"),
        ("date", "date"),
        ("created_at", "timestamptz"),
    ],
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseContent {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub default_duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exercise_content_id: Uuid,
    pub date: NaiveDate,
    pub duration_minutes: i32,
    pub repetitions: Option<i32>,
    pub quality: Option<i16>,
    pub created_at: DateTime<Utc>,
}
