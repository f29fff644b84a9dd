//! Process-local stores with the same contracts as the Postgres ones.
//!
//! Each operation holds the mutex for its whole duration, which gives the
//! same single-statement atomicity the database provides.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::Mutex;

use crate::models::{Book, NewBook, NewUser, User};
use crate::store::{BookRepository, CredentialStore, StoreError, StoreResult};

#[derive(Debug)]
struct Table<T> {
    next_id: i32,
    rows: BTreeMap<i32, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: Mutex<Table<User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock();
        Ok(users.rows.values().find(|user| user.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.lock();
        if users.rows.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let id = users.allocate_id();
        let row = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        };
        users.rows.insert(id, row.clone());
        Ok(row)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBookRepository {
    books: Mutex<Table<Book>>,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl BookRepository for MemoryBookRepository {
    async fn list_by_owner(&self, owner_id: i32) -> StoreResult<Vec<Book>> {
        let books = self.books.lock();
        Ok(books
            .rows
            .values()
            .filter(|book| book.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, owner_id: i32, book: NewBook) -> StoreResult<Book> {
        let mut books = self.books.lock();
        let id = books.allocate_id();
        let row = Book {
            id,
            title: book.title,
            author: book.author,
            owner_id,
            created_at: Some(Utc::now()),
        };
        books.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i32, owner_id: i32, book: NewBook) -> StoreResult<Book> {
        let mut books = self.books.lock();
        match books.rows.get_mut(&id) {
            Some(row) if row.owner_id == owner_id => {
                row.title = book.title;
                row.author = book.author;
                Ok(row.clone())
            }
            _ => Err(StoreError::NotFoundOrForbidden),
        }
    }

    async fn delete(&self, id: i32, owner_id: i32) -> StoreResult<Book> {
        let mut books = self.books.lock();
        let owned = books
            .rows
            .get(&id)
            .is_some_and(|row| row.owner_id == owner_id);
        if !owned {
            return Err(StoreError::NotFoundOrForbidden);
        }
        books.rows.remove(&id).ok_or(StoreError::NotFoundOrForbidden)
    }
}
