//! Persistence seam for user credentials and owned books.
//!
//! Handlers talk to the [`CredentialStore`] and [`BookRepository`] traits so
//! the HTTP layer can run against Postgres in production and against the
//! in-memory implementations in tests. Both implementations push uniqueness
//! and ownership checks into a single backend operation; callers never do a
//! read-then-write to enforce either.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{Book, NewBook, NewUser, User};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryBookRepository, MemoryCredentialStore};
pub use postgres::{PgBookRepository, PgCredentialStore};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a user with this email already exists")]
    DuplicateEmail,
    #[error("book not found for this owner")]
    NotFoundOrForbidden,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Users keyed by their normalized email address.
#[rocket::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact match on an already normalized (trimmed, lowercased) email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Insert a user. Fails with [`StoreError::DuplicateEmail`] when the
    /// email is already taken, including when a concurrent insert won.
    async fn create(&self, user: NewUser) -> StoreResult<User>;
}

/// Books, every access scoped by owner id.
#[rocket::async_trait]
pub trait BookRepository: Send + Sync {
    async fn list_by_owner(&self, owner_id: i32) -> StoreResult<Vec<Book>>;

    async fn create(&self, owner_id: i32, book: NewBook) -> StoreResult<Book>;

    /// Update title and author of book `id` if and only if it belongs to
    /// `owner_id`. A missing book and another owner's book are the same
    /// [`StoreError::NotFoundOrForbidden`] outcome.
    async fn update(&self, id: i32, owner_id: i32, book: NewBook) -> StoreResult<Book>;

    /// Delete book `id` if it belongs to `owner_id`, returning the removed row.
    async fn delete(&self, id: i32, owner_id: i32) -> StoreResult<Book>;
}

/// Shared handle managed as Rocket state.
pub type UserStore = Arc<dyn CredentialStore>;
/// Shared handle managed as Rocket state.
pub type BookStore = Arc<dyn BookRepository>;
