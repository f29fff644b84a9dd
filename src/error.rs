use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Request, catch, catchers};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::store::StoreError;
use crate::validation::FieldError;

#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<FieldError>),
    Auth(AuthError),
    NotFoundOrForbidden,
    DatabaseError(sqlx::Error),
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

pub type ApiErrorResponse = status::Custom<Json<ErrorResponse>>;
pub type ApiResult<T> = Result<T, ApiErrorResponse>;

impl ApiError {
    fn into_response(self) -> ApiErrorResponse {
        let (status, body) = match self {
            ApiError::Validation(errors) => {
                log::debug!("validation failed: {:?}", errors);
                let message = errors
                    .iter()
                    .map(|err| err.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                (
                    Status::BadRequest,
                    ErrorResponse {
                        error: "ValidationFailed".into(),
                        message,
                        errors,
                    },
                )
            }
            ApiError::Auth(err) => {
                if err.is_internal() {
                    log::error!("auth error: {}", err);
                } else {
                    log::debug!("auth error: {}", err);
                }
                (
                    err.status(),
                    ErrorResponse::new(err.kind(), err.public_message()),
                )
            }
            ApiError::NotFoundOrForbidden => (
                Status::NotFound,
                ErrorResponse::new("NotFoundOrForbidden", "🚫 Book not found or unauthorized"),
            ),
            ApiError::DatabaseError(err) => {
                log::error!("database error: {}", err);
                (
                    Status::InternalServerError,
                    ErrorResponse::new("DatabaseError", "🚫 Internal server error"),
                )
            }
        };

        status::Custom(status, Json(body))
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        err.into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Sqlx(err) => ApiError::DatabaseError(err),
            other => ApiError::Auth(other),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::Auth(AuthError::DuplicateEmail),
            StoreError::NotFoundOrForbidden => ApiError::NotFoundOrForbidden,
            StoreError::Database(err) => ApiError::DatabaseError(err),
        }
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<AuthError> for ApiErrorResponse {
    fn from(err: AuthError) -> Self {
        ApiError::from(err).into_response()
    }
}

impl From<StoreError> for ApiErrorResponse {
    fn from(err: StoreError) -> Self {
        ApiError::from(err).into_response()
    }
}

/// Failures that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database setup failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("auth setup failed: {0}")]
    Auth(#[from] AuthError),
    #[error("cors setup failed: {0}")]
    Cors(#[from] rocket_cors::Error),
}

// ===== Catchers =====
//
// Framework-level failures (guards, body parsing, unknown routes) use the
// same body shape as handler errors.

#[catch(400)]
fn bad_request() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("ValidationFailed", "🚫 Invalid request"))
}

#[catch(401)]
fn unauthorized() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Unauthenticated", "🚫 Unauthorized"))
}

#[catch(404)]
fn not_found(request: &Request<'_>) -> Json<ErrorResponse> {
    log::debug!("no route for {}", request.uri());
    Json(ErrorResponse::new("NotFound", "🚫 Not found"))
}

#[catch(422)]
fn unprocessable() -> ApiErrorResponse {
    status::Custom(
        Status::BadRequest,
        Json(ErrorResponse::new("ValidationFailed", "🚫 Invalid request")),
    )
}

#[catch(500)]
fn internal_error() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("InternalError", "🚫 Internal server error"))
}

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![bad_request, unauthorized, not_found, unprocessable, internal_error]
}
