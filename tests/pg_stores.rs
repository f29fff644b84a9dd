use book_api::api_routes;
use book_api::models::{NewBook, NewUser};
use book_api::store::{
    BookRepository, CredentialStore, PgBookRepository, PgCredentialStore, StoreError,
};
use book_api::test_support::{TestDatabase, TestDatabaseError, TestFixtures, TestRocketBuilder};
use rocket::http::{ContentType, Header, Status};
use rocket::serde::json::json;

async fn provision(test: &str) -> Option<TestDatabase> {
    match TestDatabase::new().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping {test}: {err}");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.into(),
        password_hash: "$argon2id$placeholder".into(),
        username: None,
    }
}

fn new_book(title: &str, author: &str) -> NewBook {
    NewBook {
        title: title.into(),
        author: author.into(),
    }
}

#[tokio::test]
async fn email_uniqueness_is_enforced_by_the_table() {
    let Some(test_db) = provision("email uniqueness test").await else {
        return;
    };
    let users = PgCredentialStore::new(test_db.pool_clone());

    let created = users.create(new_user("a@b.com")).await.expect("first insert");
    let err = users
        .create(new_user("a@b.com"))
        .await
        .expect_err("second insert");
    assert!(matches!(err, StoreError::DuplicateEmail));

    let found = users
        .find_by_email("a@b.com")
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(found.id, created.id);
    assert!(users.find_by_email("x@y.com").await.expect("lookup").is_none());

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn book_writes_are_scoped_to_the_owner() {
    let Some(test_db) = provision("book ownership test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let fixtures = TestFixtures::new(&pool);
    let owner = fixtures.insert_user("a@b.com", "hash").await.expect("owner");
    let other = fixtures.insert_user("c@d.com", "hash").await.expect("other");
    let book_id = fixtures
        .insert_book(owner, "Dune", "Herbert")
        .await
        .expect("book");

    let books = PgBookRepository::new(pool.clone());

    let listed = books.list_by_owner(owner).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, book_id);
    assert!(listed[0].created_at.is_some());
    assert!(books.list_by_owner(other).await.expect("list").is_empty());

    let err = books
        .update(book_id, other, new_book("Stolen", "Nobody"))
        .await
        .expect_err("foreign update");
    assert!(matches!(err, StoreError::NotFoundOrForbidden));
    let err = books.delete(book_id, other).await.expect_err("foreign delete");
    assert!(matches!(err, StoreError::NotFoundOrForbidden));

    let updated = books
        .update(book_id, owner, new_book("Dune Messiah", "Herbert"))
        .await
        .expect("owner update");
    assert_eq!(updated.title, "Dune Messiah");
    assert_eq!(updated.owner_id, owner);

    let created = books
        .create(owner, new_book("Emma", "Austen"))
        .await
        .expect("create");
    let deleted = books.delete(created.id, owner).await.expect("delete");
    assert_eq!(deleted.title, "Emma");
    assert!(matches!(
        books.delete(created.id, owner).await,
        Err(StoreError::NotFoundOrForbidden)
    ));

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn api_round_trip_against_postgres() {
    let Some(test_db) = provision("postgres API test").await else {
        return;
    };

    {
        let client = TestRocketBuilder::new()
            .manage_pg_pool(test_db.pool_clone())
            .mount_api_routes(api_routes())
            .async_client()
            .await;

        let response = client
            .post("/api/v1/auth/register")
            .header(ContentType::JSON)
            .body(json!({ "email": "a@b.com", "password": "secret1" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client
            .post("/api/v1/auth/login")
            .header(ContentType::JSON)
            .body(json!({ "email": "a@b.com", "password": "secret1" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.expect("login payload");
        let token = body["token"].as_str().expect("token").to_string();

        let response = client
            .post("/api/v1/book")
            .header(ContentType::JSON)
            .header(Header::new("Authorization", format!("Bearer {token}")))
            .body(json!({ "title": "Dune", "author": "Herbert" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let book: serde_json::Value = response.into_json().await.expect("book payload");
        assert_eq!(book["title"], "Dune");
        assert!(book["createdAt"].is_string());
    }

    let stored_hash: String =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE email = 'a@b.com'")
            .fetch_one(test_db.pool())
            .await
            .expect("hash stored");
    assert!(stored_hash.starts_with("$argon2id$"));
    assert!(!stored_hash.contains("secret1"));

    test_db.close().await.expect("failed to drop test database");
}
