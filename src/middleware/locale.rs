use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{validate_jwt, TokenKind};
use crate::i18n;

use super::auth::{extract_token, AuthUser};

/// Effective locale for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLocale(pub String);

impl RequestLocale {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn lang_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "lang")
        .map(|(_, v)| v.into_owned())
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestLocale {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let explicit = parts.uri.query().and_then(lang_param);

        // Public routes have no AuthUser, but a signed-in caller may still send a token.
        let user_locale = match parts.extensions.get::<AuthUser>() {
            Some(user) => Some(user.locale.clone()),
            None => extract_token(&parts.headers)
                .ok()
                .and_then(|t| validate_jwt(&t, TokenKind::Access).ok())
                .map(|c| c.locale),
        };

        let accept = parts
            .headers
            .get(axum::http::header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());

        Ok(RequestLocale(i18n::resolve(explicit.as_deref(), user_locale.as_deref(), accept)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lang_from_query() {
        assert_eq!(lang_param("type=1&lang=fr"), Some("fr".to_string()));
        assert_eq!(lang_param("type=1"), None);
    }
}
