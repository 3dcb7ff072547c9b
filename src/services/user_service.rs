use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{self, AuthError, TokenKind, TokenPair};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::i18n;
use crate::types::Role;
use crate::validation::{FieldErrors, Validate};

use super::{ServiceError, ServiceResult};

const USER_COLUMNS: &str = "id, email, password_hash, display_name, role, locale, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub locale: Option<String>,
}

impl Validate for RegisterInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if normalize_email(&self.email).is_none() {
            errors.add("email", "must be a valid email address");
        }
        let min = config::config().security.min_password_length;
        if self.password.chars().count() < min {
            errors.add("password", format!("must be at least {} characters", min));
        }
        if let Some(name) = &self.display_name {
            errors.length("display_name", name, 1, 80);
        }
        if let Some(locale) = &self.locale {
            errors.locale("locale", locale);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl Validate for LoginInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(!self.email.trim().is_empty(), "email", "is required");
        errors.check(!self.password.is_empty(), "password", "is required");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

impl Validate for RefreshInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(!self.refresh_token.trim().is_empty(), "refresh_token", "is required");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMeInput {
    pub display_name: Option<String>,
    pub locale: Option<String>,
}

impl Validate for UpdateMeInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.display_name {
            errors.length("display_name", name, 1, 80);
        }
        if let Some(locale) = &self.locale {
            errors.locale("locale", locale);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleInput {
    pub role: Role,
}

impl Validate for RoleInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        Ok(())
    }
}

/// User plus a fresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Trim and lowercase; `None` unless there is a non-empty local part and domain.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return None;
    }
    Some(email)
}

fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new() -> ServiceResult<Self> {
        Ok(Self::with_pool(DatabaseManager::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, input: RegisterInput) -> ServiceResult<Session> {
        let email = normalize_email(&input.email).ok_or_else(|| ServiceError::invalid("email", "must be a valid email address"))?;
        let display_name = input
            .display_name
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| default_display_name(&email));
        let locale = input
            .locale
            .as_deref()
            .and_then(i18n::canonical)
            .unwrap_or_else(|| i18n::default_locale().to_string());
        let password_hash = auth::hash_password(&input.password)?;

        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, password_hash, display_name, role, locale)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&password_hash)
        .bind(&display_name)
        .bind(Role::User.as_str())
        .bind(&locale)
        .fetch_one(&self.pool)
        .await
        .map_err(crate::database::DatabaseError::from);

        let user = match result {
            Ok(user) => user,
            Err(e) if e.is_unique_violation() => {
                return Err(ServiceError::Conflict("Email is already registered".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        info!("Registered user {}", user.id);
        self.session_for(user)
    }

    /// Unknown emails and wrong passwords fail identically.
    pub async fn login(&self, input: LoginInput) -> ServiceResult<Session> {
        let email = input.email.trim().to_lowercase();
        let user = self.find_by_email(&email).await?.ok_or_else(|| {
            warn!("Login attempt for unknown account");
            AuthError::InvalidCredentials
        })?;

        if !auth::verify_password(&input.password, &user.password_hash)? {
            warn!("Failed login for user {}", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        self.session_for(user)
    }

    pub async fn refresh(&self, input: RefreshInput) -> ServiceResult<Session> {
        let claims = auth::validate_jwt(input.refresh_token.trim(), TokenKind::Refresh)?;
        let user = self
            .find(claims.sub)
            .await?
            .ok_or_else(|| AuthError::InvalidToken("account no longer exists".to_string()))?;
        self.session_for(user)
    }

    pub async fn find(&self, id: Uuid) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<User> {
        self.find(id).await?.ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Updates the profile and re-issues tokens so the new locale is carried.
    pub async fn update_me(&self, id: Uuid, input: UpdateMeInput) -> ServiceResult<Session> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                display_name = COALESCE($2, display_name),
                locale = COALESCE($3, locale),
                updated_at = now()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(input.display_name.map(|n| n.trim().to_string()))
        .bind(input.locale.as_deref().and_then(i18n::canonical))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        self.session_for(user)
    }

    /// Deletes the account; sessions, subscriptions and badges cascade.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("User not found".to_string()));
        }
        info!("Deleted user {}", id);
        Ok(())
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> ServiceResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        info!("User {} role set to {}", id, role);
        Ok(user)
    }

    fn session_for(&self, user: User) -> ServiceResult<Session> {
        let tokens = auth::issue_token_pair(user.id, &user.email, user.role(), &user.locale)?;
        Ok(Session { user, tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM "), Some("ada@example.com".to_string()));
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["", "ada", "@example.com", "ada@", "a@b@c", "a b@c.io"] {
            assert!(normalize_email(bad).is_none(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn register_validation_collects_every_field() {
        let input = RegisterInput {
            email: "nope".into(),
            password: "short".into(),
            display_name: Some("   ".into()),
            locale: Some("xx".into()),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.get("email").is_some());
        assert!(errors.get("password").is_some());
        assert!(errors.get("display_name").is_some());
        assert!(errors.get("locale").is_some());
    }

    #[test]
    fn regional_and_uppercase_locales_are_accepted() {
        for locale in ["fr-CA", "FR", "en_GB"] {
            let input = RegisterInput {
                email: "ada@example.com".into(),
                password: "correct horse".into(),
                display_name: None,
                locale: Some(locale.into()),
            };
            assert!(input.validate().is_ok(), "{} should be accepted", locale);
        }
        assert_eq!(i18n::canonical("fr-CA").as_deref(), Some("fr"));
        assert_eq!(i18n::canonical("FR").as_deref(), Some("fr"));
        assert_eq!(i18n::canonical("de-DE"), None);
    }

    #[test]
    fn display_name_defaults_to_local_part() {
        assert_eq!(default_display_name("ada@example.com"), "ada");
    }
}
