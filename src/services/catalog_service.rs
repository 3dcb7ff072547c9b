use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Category, CategoryTranslation, LocalizedCategory, LocalizedResource};
use crate::i18n;
use crate::validation::{FieldErrors, Validate};

use super::{ServiceError, ServiceResult};

/// `POST /api/coach/categories/:id/translations`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryTranslationDto {
    pub locale: String,
    pub name: String,
}

impl Validate for CreateCategoryTranslationDto {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.locale("locale", &self.locale);
        errors.length("name", &self.name, 1, 100);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub slug: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub translations: Vec<CreateCategoryTranslationDto>,
}

impl Validate for CreateCategoryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.slug("slug", &self.slug);
        for (idx, tr) in self.translations.iter().enumerate() {
            errors.locale(&format!("translations[{}].locale", idx), &tr.locale);
            errors.length(&format!("translations[{}].name", idx), &tr.name, 1, 100);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub translations: Vec<CategoryTranslation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceTranslationInput {
    pub locale: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateResourceInput {
    pub slug: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub is_premium: bool,
    pub read_time_minutes: Option<i32>,
    pub translations: Vec<ResourceTranslationInput>,
}

impl Validate for CreateResourceInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.slug("slug", &self.slug);
        if let Some(minutes) = self.read_time_minutes {
            errors.check((1..=240).contains(&minutes), "read_time_minutes", "must be between 1 and 240");
        }
        if self.translations.is_empty() {
            errors.add("translations", "must contain at least one translation");
        }
        for (idx, tr) in self.translations.iter().enumerate() {
            errors.locale(&format!("translations[{}].locale", idx), &tr.locale);
            errors.length(&format!("translations[{}].title", idx), &tr.title, 1, 200);
            errors.check(!tr.body.trim().is_empty(), &format!("translations[{}].body", idx), "is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResourceQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

impl Validate for ResourceQuery {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(q) = &self.q {
            errors.check(q.chars().count() <= 100, "q", "must be at most 100 characters");
        }
        errors.into_result()
    }
}

/// `%term%` with LIKE metacharacters escaped.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// Picks one translation per resource: requested locale, then default, then any.
const LOCALIZED_RESOURCE_SELECT: &str = "SELECT r.id, r.slug, r.category_id, c.slug AS category_slug, r.author_id,
        r.is_premium, r.read_time_minutes, tr.locale, tr.title, tr.summary, tr.body, r.created_at
     FROM resources r
     JOIN categories c ON c.id = r.category_id
     JOIN LATERAL (
        SELECT t.locale, t.title, t.summary, t.body
        FROM resource_translations t
        WHERE t.resource_id = r.id
        ORDER BY (t.locale = $1) DESC, (t.locale = $2) DESC, t.locale
        LIMIT 1
     ) tr ON TRUE";

pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new() -> ServiceResult<Self> {
        Ok(Self::with_pool(DatabaseManager::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_categories(&self, locale: &str) -> ServiceResult<Vec<LocalizedCategory>> {
        let categories = sqlx::query_as::<_, LocalizedCategory>(
            "SELECT c.id, c.slug, c.icon,
                    COALESCE(tr.name, dtr.name, c.slug) AS name,
                    COALESCE(tr.locale, dtr.locale) AS locale
             FROM categories c
             LEFT JOIN category_translations tr ON tr.category_id = c.id AND tr.locale = $1
             LEFT JOIN category_translations dtr ON dtr.category_id = c.id AND dtr.locale = $2
             ORDER BY name",
        )
        .bind(locale)
        .bind(i18n::default_locale())
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn create_category(&self, input: CreateCategoryInput) -> ServiceResult<CategoryDetail> {
        let mut tx = self.pool.begin().await?;

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, slug, icon) VALUES ($1, $2, $3)
             RETURNING id, slug, icon, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&input.slug)
        .bind(&input.icon)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| slug_conflict(e, &input.slug))?;

        let mut translations = Vec::with_capacity(input.translations.len());
        for tr in &input.translations {
            let row = sqlx::query_as::<_, CategoryTranslation>(
                "INSERT INTO category_translations (category_id, locale, name) VALUES ($1, $2, $3)
                 ON CONFLICT (category_id, locale) DO UPDATE SET name = EXCLUDED.name
                 RETURNING category_id, locale, name",
            )
            .bind(category.id)
            .bind(i18n::canonical(&tr.locale))
            .bind(tr.name.trim())
            .fetch_one(&mut *tx)
            .await?;
            translations.push(row);
        }

        tx.commit().await?;
        info!("Created category {}", category.slug);
        Ok(CategoryDetail { category, translations })
    }

    /// Insert or replace the name of `category_id` in one locale.
    pub async fn upsert_category_translation(
        &self,
        category_id: Uuid,
        dto: CreateCategoryTranslationDto,
    ) -> ServiceResult<CategoryTranslation> {
        let result = sqlx::query_as::<_, CategoryTranslation>(
            "INSERT INTO category_translations (category_id, locale, name) VALUES ($1, $2, $3)
             ON CONFLICT (category_id, locale) DO UPDATE SET name = EXCLUDED.name
             RETURNING category_id, locale, name",
        )
        .bind(category_id)
        .bind(i18n::canonical(&dto.locale))
        .bind(dto.name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from);

        match result {
            Ok(row) => Ok(row),
            Err(e) if e.is_foreign_key_violation() => Err(ServiceError::NotFound("Category not found".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_resources(&self, query: &ResourceQuery, locale: &str) -> ServiceResult<Vec<LocalizedResource>> {
        let pattern = query.q.as_deref().filter(|q| !q.trim().is_empty()).map(like_pattern);
        let resources = sqlx::query_as::<_, LocalizedResource>(&format!(
            "{} WHERE ($3::text IS NULL OR c.slug = $3)
                AND ($4::text IS NULL OR tr.title ILIKE $4)
             ORDER BY r.created_at DESC",
            LOCALIZED_RESOURCE_SELECT
        ))
        .bind(locale)
        .bind(i18n::default_locale())
        .bind(&query.category)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(resources)
    }

    pub async fn get_resource(&self, slug: &str, locale: &str) -> ServiceResult<LocalizedResource> {
        sqlx::query_as::<_, LocalizedResource>(&format!("{} WHERE r.slug = $3", LOCALIZED_RESOURCE_SELECT))
            .bind(locale)
            .bind(i18n::default_locale())
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Resource not found".to_string()))
    }

    pub async fn create_resource(&self, author_id: Uuid, input: CreateResourceInput) -> ServiceResult<LocalizedResource> {
        let mut tx = self.pool.begin().await?;

        let resource_id = Uuid::new_v4();
        let result = sqlx::query(
            "INSERT INTO resources (id, slug, category_id, author_id, is_premium, read_time_minutes)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(resource_id)
        .bind(&input.slug)
        .bind(input.category_id)
        .bind(author_id)
        .bind(input.is_premium)
        .bind(input.read_time_minutes.unwrap_or(5))
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from);

        match result {
            Ok(_) => {}
            Err(e) if e.is_unique_violation() => {
                return Err(ServiceError::Conflict(format!("Slug '{}' is already taken", input.slug)));
            }
            Err(e) if e.is_foreign_key_violation() => {
                return Err(ServiceError::invalid("category_id", "unknown category"));
            }
            Err(e) => return Err(e.into()),
        }

        for tr in &input.translations {
            sqlx::query(
                "INSERT INTO resource_translations (resource_id, locale, title, summary, body)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (resource_id, locale) DO UPDATE
                    SET title = EXCLUDED.title, summary = EXCLUDED.summary, body = EXCLUDED.body",
            )
            .bind(resource_id)
            .bind(i18n::canonical(&tr.locale))
            .bind(tr.title.trim())
            .bind(&tr.summary)
            .bind(&tr.body)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("User {} published resource {}", author_id, input.slug);

        let locale = input
            .translations
            .first()
            .and_then(|t| i18n::canonical(&t.locale))
            .unwrap_or_else(|| i18n::default_locale().to_string());
        self.get_resource(&input.slug, &locale).await
    }
}

fn slug_conflict(err: sqlx::Error, slug: &str) -> ServiceError {
    let err = DatabaseError::from(err);
    if err.is_unique_violation() {
        ServiceError::Conflict(format!("Slug '{}' is already taken", slug))
    } else {
        err.into()
    }
}
