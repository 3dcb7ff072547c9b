use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::filter::TableSpec;

pub const MEDITATION_CONTENTS: TableSpec = TableSpec {
    name: "meditation_contents",
    columns: &[
        "id",
        "type_id",
        "title",
        "description",
        "mode",
        "duration_minutes",
        "media_url",
        "soundcloud_url",
        "is_premium",
        "is_active",
        "sort_order",
        "created_by",
        "created_at",
    ],
    casts: &[("id", "uuid"), ("type_id", "uuid"), ("created_by", "uuid"), ("created_at", "timestamptz")],
};

pub const MEDITATION_SESSIONS: TableSpec = TableSpec {
    name: "meditation_sessions",
    columns: &[
        "id",
        "user_id",
        "type_id",
        "content_id",
        "started_at",
        "duration_minutes",
        "mood_before",
        "mood_after",
        "created_at",
    ],
    casts: &[
        ("id", "uuid"),
        ("user_id", "uuid"),
        ("type_id", "uuid"),
        ("content_id", "uuid"),
        ("started_at", "timestamptz"),
        ("created_at", "timestamptz"),
    ],
};

/// A meditation type with its name resolved for one locale.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MeditationType {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub default_duration_minutes: i32,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MeditationContent {
    pub id: Uuid,
    pub type_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub mode: String,
    pub duration_minutes: i32,
    pub media_url: Option<String>,
    pub soundcloud_url: Option<String>,
    pub is_premium: bool,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MeditationSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub type_id: Uuid,
    pub content_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub mood_before: Option<i16>,
    pub mood_after: Option<i16>,
    pub created_at: DateTime<Utc>,
}
