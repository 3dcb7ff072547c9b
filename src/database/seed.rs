use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::types::{ExerciseKind, Metric};

const CATALOG_YAML: &str = include_str!("../../seeds/catalog.yaml");

#[derive(Debug, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub badges: Vec<BadgeSeed>,
    #[serde(default)]
    pub meditation_types: Vec<MeditationTypeSeed>,
    #[serde(default)]
    pub exercise_contents: Vec<ExerciseContentSeed>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct BadgeSeed {
    pub slug: String,
    pub metric: Metric,
    pub threshold: i32,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MeditationTypeSeed {
    pub slug: String,
    pub default_duration_minutes: i32,
    #[serde(default)]
    pub sort_order: i32,
    pub translations: BTreeMap<String, TypeTranslationSeed>,
}

#[derive(Debug, Deserialize)]
pub struct TypeTranslationSeed {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseContentSeed {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: ExerciseKind,
    pub default_duration_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub slug: String,
    pub icon: Option<String>,
    pub translations: BTreeMap<String, String>,
}

impl Catalog {
    pub fn parse(yaml: &str) -> Result<Self, DatabaseError> {
        let catalog: Catalog = serde_yaml::from_str(yaml).map_err(|e| DatabaseError::Seed(e.to_string()))?;
        catalog.check()?;
        Ok(catalog)
    }

    pub fn bundled() -> Result<Self, DatabaseError> {
        Self::parse(CATALOG_YAML)
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if let Some(b) = self.badges.iter().find(|b| b.threshold <= 0) {
            return Err(DatabaseError::Seed(format!("badge {} needs a positive threshold", b.slug)));
        }
        if let Some(t) = self.meditation_types.iter().find(|t| t.translations.is_empty()) {
            return Err(DatabaseError::Seed(format!("meditation type {} has no translations", t.slug)));
        }
        Ok(())
    }
}

/// Upsert the bundled catalog. Rows are matched on slug so re-running is safe.
pub async fn seed_catalog() -> Result<(), DatabaseError> {
    let catalog = Catalog::bundled()?;
    let pool = DatabaseManager::pool()?;
    let mut tx = pool.begin().await?;

    for badge in &catalog.badges {
        sqlx::query(
            "INSERT INTO badges (id, slug, metric, threshold, icon) VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (slug) DO UPDATE SET metric = EXCLUDED.metric, threshold = EXCLUDED.threshold, icon = EXCLUDED.icon",
        )
        .bind(Uuid::new_v4())
        .bind(&badge.slug)
        .bind(badge.metric.as_str())
        .bind(badge.threshold)
        .bind(&badge.icon)
        .execute(&mut *tx)
        .await?;
    }

    for ty in &catalog.meditation_types {
        let (type_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO meditation_types (id, slug, default_duration_minutes, sort_order) VALUES ($1, $2, $3, $4)
             ON CONFLICT (slug) DO UPDATE SET default_duration_minutes = EXCLUDED.default_duration_minutes,
                 sort_order = EXCLUDED.sort_order
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&ty.slug)
        .bind(ty.default_duration_minutes)
        .bind(ty.sort_order)
        .fetch_one(&mut *tx)
        .await?;

        for (locale, tr) in &ty.translations {
            sqlx::query(
                "INSERT INTO meditation_type_translations (type_id, locale, name, description) VALUES ($1, $2, $3, $4)
                 ON CONFLICT (type_id, locale) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description",
            )
            .bind(type_id)
            .bind(locale)
            .bind(&tr.name)
            .bind(&tr.description)
            .execute(&mut *tx)
            .await?;
        }
    }

    for content in &catalog.exercise_contents {
        sqlx::query(
            "INSERT INTO exercise_contents (id, slug, name, description, kind, default_duration_minutes)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description,
                 kind = EXCLUDED.kind, default_duration_minutes = EXCLUDED.default_duration_minutes",
        )
        .bind(Uuid::new_v4())
        .bind(&content.slug)
        .bind(&content.name)
        .bind(&content.description)
        .bind(content.kind.as_str())
        .bind(content.default_duration_minutes)
        .execute(&mut *tx)
        .await?;
    }

    for category in &catalog.categories {
        let (category_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO categories (id, slug, icon) VALUES ($1, $2, $3)
             ON CONFLICT (slug) DO UPDATE SET icon = EXCLUDED.icon
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&category.slug)
        .bind(&category.icon)
        .fetch_one(&mut *tx)
        .await?;

        for (locale, name) in &category.translations {
            sqlx::query(
                "INSERT INTO category_translations (category_id, locale, name) VALUES ($1, $2, $3)
                 ON CONFLICT (category_id, locale) DO UPDATE SET name = EXCLUDED.name",
            )
            .bind(category_id)
            .bind(locale)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    info!(
        "Seeded catalog: {} badges, {} meditation types, {} exercises, {} categories",
        catalog.badges.len(),
        catalog.meditation_types.len(),
        catalog.exercise_contents.len(),
        catalog.categories.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_parses() {
        let catalog = Catalog::bundled().unwrap();
        assert!(!catalog.badges.is_empty());
        assert!(catalog.meditation_types.iter().all(|t| t.translations.contains_key("en")));
        // every metric has at least one badge
        for metric in Metric::ALL {
            assert!(catalog.badges.iter().any(|b| b.metric == *metric), "no badge for {}", metric);
        }
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let yaml = "badges:\n  - { slug: x, metric: steps, threshold: 1 }\n";
        assert!(matches!(Catalog::parse(yaml), Err(DatabaseError::Seed(_))));
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        let yaml = "badges:\n  - { slug: x, metric: sleep_sessions, threshold: 0 }\n";
        assert!(Catalog::parse(yaml).is_err());
    }
}
