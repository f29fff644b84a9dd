use sqlx::PgPool;

use crate::models::{Book, NewBook, NewUser, User};
use crate::store::{BookRepository, CredentialStore, StoreError, StoreResult};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, username)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.username.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(err)
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl BookRepository for PgBookRepository {
    async fn list_by_owner(&self, owner_id: i32) -> StoreResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, owner_id, created_at
            FROM books
            WHERE owner_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn create(&self, owner_id: i32, book: NewBook) -> StoreResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, author, owner_id, created_at
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    async fn update(&self, id: i32, owner_id: i32, book: NewBook) -> StoreResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2
            WHERE id = $3 AND owner_id = $4
            RETURNING id, title, author, owner_id, created_at
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFoundOrForbidden)
    }

    async fn delete(&self, id: i32, owner_id: i32) -> StoreResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            DELETE FROM books
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, author, owner_id, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFoundOrForbidden)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err
                .code()
                .map(|code| code == UNIQUE_VIOLATION)
                .unwrap_or(false)
    )
}
