use rocket::http::Status;
use thiserror::Error;

use crate::store::StoreError;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("token signature invalid")]
    InvalidSignature,
    #[error("token expired")]
    TokenExpired,
    #[error("token malformed")]
    TokenMalformed,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("stored credential is corrupt: {0}")]
    CorruptCredential(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("argon2 parameter error: {0}")]
    Argon2(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::Unauthenticated
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::TokenMalformed
            | AuthError::InvalidCredentials => Status::Unauthorized,
            AuthError::UserNotFound => Status::NotFound,
            AuthError::DuplicateEmail => Status::BadRequest,
            AuthError::CorruptCredential(_) | AuthError::Config(_) => Status::InternalServerError,
            AuthError::Sqlx(_)
            | AuthError::Jwt(_)
            | AuthError::Argon2(_)
            | AuthError::PasswordHash(_) => Status::InternalServerError,
        }
    }

    /// Short machine-readable kind for the `error` field of response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::TokenMalformed => "Unauthenticated",
            AuthError::InvalidCredentials => "InvalidCredentials",
            AuthError::UserNotFound => "UserNotFound",
            AuthError::DuplicateEmail => "DuplicateEmail",
            _ => "InternalError",
        }
    }

    /// Message safe to show to API clients. Internal failures collapse to a
    /// generic text so no backend detail leaks.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::TokenMalformed => "🚫 Unauthorized",
            AuthError::InvalidCredentials => "🚫 Invalid password",
            AuthError::UserNotFound => "🚫 User not found",
            AuthError::DuplicateEmail => "🚫 User already exists",
            _ => "🚫 Internal server error",
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status() == Status::InternalServerError
    }
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        AuthError::Argon2(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::Database(err) => AuthError::Sqlx(err),
            StoreError::NotFoundOrForbidden => {
                log::error!("credential store reported an ownership miss");
                AuthError::Config("credential store returned NotFoundOrForbidden".into())
            }
        }
    }
}
