use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::types::Role;

pub mod password;

pub use password::{hash_password, verify_password};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Wrong token type")]
    WrongTokenKind,

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub locale: String,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: impl Into<String>, role: Role, locale: impl Into<String>, kind: TokenKind) -> Self {
        let now = Utc::now();
        let security = &config::config().security;
        let hours = match kind {
            TokenKind::Access => security.jwt_expiry_hours,
            TokenKind::Refresh => security.refresh_expiry_hours,
        };
        let exp = (now + Duration::hours(hours as i64)).timestamp();

        Self {
            sub: user_id,
            email: email.into(),
            role,
            locale: locale.into(),
            kind,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Access + refresh pair handed out on login, register and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

fn secret() -> Result<&'static str, AuthError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    Ok(secret)
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Decode and validate signature + expiry, then check the token kind.
pub fn validate_jwt(token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    if token_data.claims.kind != expected {
        return Err(AuthError::WrongTokenKind);
    }
    Ok(token_data.claims)
}

pub fn issue_token_pair(user_id: Uuid, email: &str, role: Role, locale: &str) -> Result<TokenPair, AuthError> {
    let access = Claims::new(user_id, email, role, locale, TokenKind::Access);
    let refresh = Claims::new(user_id, email, role, locale, TokenKind::Refresh);
    let expires_in = access.exp - access.iat;

    Ok(TokenPair {
        access_token: generate_jwt(&access)?,
        refresh_token: generate_jwt(&refresh)?,
        token_type: "Bearer",
        expires_in,
    })
}
