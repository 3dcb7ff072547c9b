//! Locale negotiation.
//!
//! Resolution order (highest to lowest priority):
//! 1. Explicit `?lang=` query parameter
//! 2. The signed-in user's stored locale
//! 3. Best match from the `Accept-Language` header
//! 4. Configured default locale

use crate::config;

pub fn supported_locales() -> &'static [String] {
    &config::config().i18n.supported_locales
}

pub fn default_locale() -> &'static str {
    &config::config().i18n.default_locale
}

/// The stored form of a client-supplied locale (`FR`, `fr-CA` -> `fr`), if supported.
pub fn canonical(locale: &str) -> Option<String> {
    normalize(locale, supported_locales())
}

/// Reduce a language tag (`fr-CA`, `FR_fr`) to a supported primary subtag.
pub fn normalize(tag: &str, supported: &[String]) -> Option<String> {
    let primary = tag
        .trim()
        .split(|c| c == '-' || c == '_')
        .next()?
        .to_ascii_lowercase();
    if primary.is_empty() {
        return None;
    }
    supported.iter().find(|l| **l == primary).cloned()
}

/// Pick the highest-weighted supported language from an `Accept-Language` value.
pub fn negotiate(header: &str, supported: &[String]) -> Option<String> {
    let mut candidates: Vec<(f32, usize, String)> = header
        .split(',')
        .enumerate()
        .filter_map(|(idx, part)| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let q = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .next()
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            if q <= 0.0 {
                return None;
            }
            normalize(tag, supported).map(|l| (q, idx, l))
        })
        .collect();

    // stable on header order for equal weights
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1)));
    candidates.into_iter().next().map(|(_, _, l)| l)
}

pub fn resolve_with(
    explicit: Option<&str>,
    user: Option<&str>,
    accept_language: Option<&str>,
    supported: &[String],
    default: &str,
) -> String {
    explicit
        .and_then(|l| normalize(l, supported))
        .or_else(|| user.and_then(|l| normalize(l, supported)))
        .or_else(|| accept_language.and_then(|h| negotiate(h, supported)))
        .unwrap_or_else(|| default.to_string())
}

pub fn resolve(explicit: Option<&str>, user: Option<&str>, accept_language: Option<&str>) -> String {
    resolve_with(explicit, user, accept_language, supported_locales(), default_locale())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> Vec<String> {
        vec!["en".to_string(), "fr".to_string()]
    }

    #[test]
    fn region_suffix_reduces_to_primary() {
        assert_eq!(normalize("fr-CA", &supported()), Some("fr".to_string()));
        assert_eq!(normalize("EN_gb", &supported()), Some("en".to_string()));
        assert_eq!(normalize("de-DE", &supported()), None);
    }

    #[test]
    fn accept_language_respects_weights() {
        let header = "de-DE,de;q=0.9,fr;q=0.8,en;q=0.7";
        assert_eq!(negotiate(header, &supported()), Some("fr".to_string()));

        let header = "en;q=0.5, fr-BE;q=0.6";
        assert_eq!(negotiate(header, &supported()), Some("fr".to_string()));
    }

    #[test]
    fn accept_language_ignores_zero_weight_and_wildcard() {
        assert_eq!(negotiate("fr;q=0, *", &supported()), None);
    }

    #[test]
    fn resolution_order() {
        let s = supported();
        assert_eq!(resolve_with(Some("fr"), Some("en"), Some("en"), &s, "en"), "fr");
        assert_eq!(resolve_with(Some("xx"), Some("fr"), Some("en"), &s, "en"), "fr");
        assert_eq!(resolve_with(None, None, Some("fr-FR,en;q=0.5"), &s, "en"), "fr");
        assert_eq!(resolve_with(None, None, None, &s, "en"), "en");
    }
}
