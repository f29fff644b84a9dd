//! Book CRUD, every operation scoped to the authenticated owner.

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post, put};
use rocket_okapi::openapi;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{Book, BookRequest, MessageResponse};
use crate::store::BookStore;

/// An id that is not a valid `i32` cannot name any row.
fn book_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFoundOrForbidden)
}

/// List the caller's books.
#[openapi(tag = "Books")]
#[get("/book")]
pub async fn list_books(user: AuthUser, books: &State<BookStore>) -> ApiResult<Json<Vec<Book>>> {
    let books = books.list_by_owner(user.id).await?;
    Ok(Json(books))
}

/// Create a book owned by the caller.
#[openapi(tag = "Books")]
#[post("/book", data = "<payload>")]
pub async fn create_book(
    user: AuthUser,
    books: &State<BookStore>,
    payload: Json<BookRequest>,
) -> ApiResult<status::Custom<Json<Book>>> {
    let new_book = payload.into_inner().validate().map_err(ApiError::from)?;
    let book = books.create(user.id, new_book).await?;
    log::info!("user {} created book {}", user.id, book.id);
    Ok(status::Custom(Status::Created, Json(book)))
}

/// Replace title and author of one of the caller's books.
#[openapi(tag = "Books")]
#[put("/book/<id>", data = "<payload>")]
pub async fn update_book(
    id: &str,
    user: AuthUser,
    books: &State<BookStore>,
    payload: Json<BookRequest>,
) -> ApiResult<Json<Book>> {
    let id = book_id(id)?;
    let new_book = payload.into_inner().validate().map_err(ApiError::from)?;
    let book = books.update(id, user.id, new_book).await?;
    Ok(Json(book))
}

/// Delete one of the caller's books.
#[openapi(tag = "Books")]
#[delete("/book/<id>")]
pub async fn delete_book(
    id: &str,
    user: AuthUser,
    books: &State<BookStore>,
) -> ApiResult<Json<MessageResponse>> {
    let book = books.delete(book_id(id)?, user.id).await?;
    log::info!("user {} deleted book {}", user.id, book.id);
    Ok(Json(MessageResponse {
        message: "✅ Book deleted successfully".to_string(),
    }))
}
