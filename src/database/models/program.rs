use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::filter::TableSpec;

pub const PROGRAMS: TableSpec = TableSpec {
    name: "programs",
    columns: &["id", "slug", "title", "description", "kind", "created_by", "created_at"],
    casts: &[("id", "uuid"), ("created_by", "uuid"), ("created_at", "timestamptz")],
};

pub const USER_PROGRAMS: TableSpec = TableSpec {
    name: "user_programs",
    columns: &["id", "user_id", "program_id", "started_at", "completed_at"],
    casts: &[
        ("id", "uuid"),
        ("user_id", "uuid"),
        ("program_id", "uuid"),
        ("started_at", "timestamptz"),
        ("completed_at", "timestamptz"),
    ],
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Program {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub kind: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgramDay {
    pub program_id: Uuid,
    pub day_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub exercise_content_id: Option<Uuid>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProgram {
    pub id: Uuid,
    pub user_id: Uuid,
    pub program_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
