use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validation::{self, FieldError};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A registration that passed validation, with email and username normalized.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, Vec<FieldError>> {
        let email = validation::normalize_email(&self.email);
        let username = self.username.map(|name| name.trim().to_lowercase());

        let mut errors = Vec::new();
        validation::email(&mut errors, &email);
        validation::password(&mut errors, &self.password);
        if let Some(name) = &username {
            validation::min_length(
                &mut errors,
                "username",
                name,
                3,
                "🚫 Username must be at least 3 characters long",
            );
            validation::max_length(
                &mut errors,
                "username",
                name,
                20,
                "🚫 Username must be at most 20 characters long",
            );
        }

        if errors.is_empty() {
            Ok(Registration {
                email,
                password: self.password,
                username,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> Result<Credentials, Vec<FieldError>> {
        let email = validation::normalize_email(&self.email);

        let mut errors = Vec::new();
        validation::email(&mut errors, &email);
        validation::password(&mut errors, &self.password);

        if errors.is_empty() {
            Ok(Credentials {
                email,
                password: self.password,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_normalizes_email_and_username() {
        let registration = RegisterRequest {
            email: "  A@B.com ".into(),
            password: "secret1".into(),
            username: Some(" Reader ".into()),
        }
        .validate()
        .expect("valid registration");

        assert_eq!(registration.email, "a@b.com");
        assert_eq!(registration.username.as_deref(), Some("reader"));
        assert_eq!(registration.password, "secret1");
    }

    #[test]
    fn registration_reports_every_bad_field() {
        let errors = RegisterRequest {
            email: "nope".into(),
            password: "12345".into(),
            username: Some("ab".into()),
        }
        .validate()
        .expect_err("invalid registration");

        let fields: Vec<_> = errors.iter().map(|err| err.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "password", "username"]);
    }

    #[test]
    fn username_longer_than_twenty_is_rejected() {
        let errors = RegisterRequest {
            email: "a@b.com".into(),
            password: "secret1".into(),
            username: Some("x".repeat(21)),
        }
        .validate()
        .expect_err("username too long");

        assert_eq!(
            errors[0].message,
            "🚫 Username must be at most 20 characters long"
        );
    }

    #[test]
    fn missing_fields_become_validation_errors() {
        let request: LoginRequest = serde_json::from_str("{}").expect("defaults apply");
        let errors = request.validate().expect_err("empty login");
        assert_eq!(errors.len(), 2);
    }
}
