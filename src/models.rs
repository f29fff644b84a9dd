use chrono::{DateTime, Utc};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::{self, FieldError};

// ===== Users =====

/// A stored user row. Carries the password hash, so it is deliberately not
/// serializable; use [`PublicUser`] for anything leaving the service.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: Option<String>,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i32,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

// ===== Books =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub owner_id: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Validated title and author for a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

impl BookRequest {
    pub fn validate(self) -> Result<NewBook, Vec<FieldError>> {
        let mut errors = Vec::new();
        validation::min_length(
            &mut errors,
            "title",
            &self.title,
            3,
            "🚫 Title must be at least 3 characters",
        );
        validation::min_length(
            &mut errors,
            "author",
            &self.author,
            3,
            "🚫 Author must be at least 3 characters",
        );

        if errors.is_empty() {
            Ok(NewBook {
                title: self.title,
                author: self.author,
            })
        } else {
            Err(errors)
        }
    }
}

// ===== Shared responses =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_serializes_with_camel_case_owner() {
        let book = Book {
            id: 1,
            title: "Dune".into(),
            author: "Herbert".into(),
            owner_id: 7,
            created_at: None,
        };
        let value = serde_json::to_value(&book).expect("serialize");
        assert_eq!(value["ownerId"], 7);
        assert!(value.get("owner_id").is_none());
    }

    #[test]
    fn short_title_and_author_are_both_reported() {
        let errors = BookRequest {
            title: "Du".into(),
            author: "".into(),
        }
        .validate()
        .expect_err("too short");
        let fields: Vec<_> = errors.iter().map(|err| err.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "author"]);
    }

    #[test]
    fn three_character_fields_are_accepted() {
        let book = BookRequest {
            title: "Ubi".into(),
            author: "Dic".into(),
        }
        .validate()
        .expect("valid");
        assert_eq!(book.title, "Ubi");
    }
}
