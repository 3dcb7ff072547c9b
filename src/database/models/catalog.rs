use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Category with its name resolved for one locale (falls back to the slug).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocalizedCategory {
    pub id: Uuid,
    pub slug: String,
    pub icon: Option<String>,
    pub name: String,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategoryTranslation {
    pub category_id: Uuid,
    pub locale: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocalizedResource {
    pub id: Uuid,
    pub slug: String,
    pub category_id: Uuid,
    pub category_slug: String,
    pub author_id: Option<Uuid>,
    pub is_premium: bool,
    pub read_time_minutes: i32,
    pub locale: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
