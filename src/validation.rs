//! Request payload validation.
//!
//! Every incoming DTO implements [`Validate`], collecting per-field messages
//! into [`FieldErrors`] so clients get all problems in one response.

use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a message for `field`. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.errors
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn score(&mut self, field: &str, value: Option<i16>) {
        if let Some(v) = value {
            self.check((1..=5).contains(&v), field, "must be between 1 and 5");
        }
    }

    pub fn minutes(&mut self, field: &str, value: i32) {
        self.check((1..=600).contains(&value), field, "must be between 1 and 600 minutes");
    }

    /// Session dates may sit at most one day ahead to absorb client clock skew.
    pub fn not_future(&mut self, field: &str, date: NaiveDate) {
        let limit = (Utc::now() + Duration::days(1)).date_naive();
        self.check(date <= limit, field, "cannot be in the future");
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len < min || len > max {
            self.add(field, format!("must be between {} and {} characters", min, max));
        }
    }

    pub fn slug(&mut self, field: &str, value: &str) {
        let ok = !value.is_empty()
            && value.len() <= 80
            && value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !value.starts_with('-')
            && !value.ends_with('-');
        self.check(ok, field, "must be lowercase letters, digits and dashes");
    }

    pub fn locale(&mut self, field: &str, value: &str) {
        self.check(crate::i18n::canonical(value).is_some(), field, "unsupported locale");
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields: Vec<_> = self.errors.iter().collect();
        fields.sort();
        let parts: Vec<String> = fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl std::error::Error for FieldErrors {}

/// Implemented by request DTOs.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("email", "is required");
        errors.add("email", "is invalid");
        assert_eq!(errors.get("email"), Some("is required"));
    }

    #[test]
    fn score_bounds() {
        let mut errors = FieldErrors::new();
        errors.score("quality", Some(5));
        errors.score("mood", None);
        assert!(errors.is_empty());
        errors.score("quality", Some(6));
        assert!(errors.get("quality").is_some());
    }

    #[test]
    fn slug_rules() {
        let mut errors = FieldErrors::new();
        errors.slug("a", "deep-sleep-7");
        assert!(errors.is_empty());
        errors.slug("b", "Deep Sleep");
        errors.slug("c", "-leading");
        errors.slug("d", "");
        assert!(errors.get("b").is_some());
        assert!(errors.get("c").is_some());
        assert!(errors.get("d").is_some());
    }

    #[test]
    fn future_dates_are_rejected() {
        let mut errors = FieldErrors::new();
        errors.not_future("date", Utc::now().date_naive());
        assert!(errors.is_empty());
        errors.not_future("date", Utc::now().date_naive() + Duration::days(5));
        assert_eq!(errors.get("date"), Some("cannot be in the future"));
    }
}
