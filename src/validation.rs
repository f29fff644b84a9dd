//! Field-level input checks shared by the auth and book handlers.

use std::sync::LazyLock;

use regex::Regex;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

/// One rejected input field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Trim and lowercase an email so lookups and the unique index agree.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    !email.contains("..") && EMAIL_PATTERN.is_match(email)
}

pub(crate) fn email(errors: &mut Vec<FieldError>, email: &str) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "🚫 Invalid email address"));
    }
}

pub(crate) fn password(errors: &mut Vec<FieldError>, password: &str) {
    min_length(
        errors,
        "password",
        password,
        6,
        "🚫 Password must be at least 6 characters long",
    );
}

pub(crate) fn min_length(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: &str,
    min: usize,
    message: &str,
) {
    if value.chars().count() < min {
        errors.push(FieldError::new(field, message));
    }
}

pub(crate) fn max_length(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: &str,
    max: usize,
    message: &str,
) {
    if value.chars().count() > max {
        errors.push(FieldError::new(field, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  A@B.Com \n"), "a@b.com");
    }

    #[test]
    fn accepts_ordinary_addresses() {
        for email in ["a@b.com", "first.last+tag@mail.example.org", "x_y@sub-domain.io"] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in ["", "plain", "@b.com", "a@", "a@b", "a b@c.com", "a@@b.com", "a..b@c.com"] {
            assert!(!is_valid_email(email), "{email:?} should be rejected");
        }
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let mut errors = Vec::new();
        min_length(&mut errors, "title", "ñúé", 3, "too short");
        assert!(errors.is_empty());
        max_length(&mut errors, "username", "ñúé", 2, "too long");
        assert_eq!(errors, vec![FieldError::new("username", "too long")]);
    }
}
