pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod store;
pub mod validation;

use crate::auth::AuthState;
use crate::config::AppConfig;
use crate::error::StartupError;
use crate::request_logger::RequestLogger;
use crate::store::{BookStore, PgBookRepository, PgCredentialStore, UserStore};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket, Route};
use rocket_cors::{AllowedOrigins, Cors, CorsOptions};
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use sqlx::PgPool;
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Every API route, including the generated `openapi.json`.
pub fn api_routes() -> Vec<Route> {
    openapi_get_routes![
        // Health routes
        routes::health::health_check,
        // Auth routes
        auth::routes::register,
        auth::routes::login,
        // Book routes
        routes::books::list_books,
        routes::books::create_book,
        routes::books::update_book,
        routes::books::delete_book,
    ]
}

fn cors() -> Result<Cors, rocket_cors::Error> {
    CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Put, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .to_cors()
}

/// Assemble the server from an already validated configuration.
pub fn rocket(config: AppConfig) -> Result<Rocket<Build>, StartupError> {
    init_logger();

    let pool = db::connect_lazy(&config.database)?;
    let auth_state = AuthState::from_config(config.auth)?;
    let users: UserStore = Arc::new(PgCredentialStore::new(pool.clone()));
    let books: BookStore = Arc::new(PgBookRepository::new(pool.clone()));

    let figment = rocket::Config::figment().merge(("port", config.port));

    log::info!("starting book API on port {}", config.port);

    Ok(rocket::custom(figment)
        .attach(RequestLogger)
        .attach(cors()?)
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                let Some(pool) = rocket.state::<PgPool>() else {
                    log::error!("database pool not available for migrations");
                    return Err(rocket);
                };
                match db::run_migrations(pool).await {
                    Ok(()) => {
                        log::info!("database migrations successful");
                        Ok(rocket)
                    }
                    Err(e) => {
                        log::error!("database migrations failed: {}", e);
                        Err(rocket)
                    }
                }
            },
        ))
        .manage(pool)
        .manage(auth_state)
        .manage(users)
        .manage(books)
        .mount("/api/v1", api_routes())
        .register("/", error::catchers())
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Book API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        ))
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::serde::json::json;
    use rocket::{Build, Rocket, Route};
    use sqlx::PgPool;

    use crate::auth::responses::LoginResponse;
    use crate::auth::{AuthConfig, AuthState, PasswordService};
    use crate::models::PublicUser;
    use crate::store::{
        BookStore, MemoryBookRepository, MemoryCredentialStore, PgBookRepository,
        PgCredentialStore, UserStore,
    };

    pub use database::{TestDatabase, TestDatabaseError};

    /// Base64 signing secret shared by tests.
    pub const TEST_JWT_SECRET: &str = "dGVzdC1zaWduaW5nLXNlY3JldA==";

    /// Auth state with a cheap Argon2 cost so tests stay fast.
    pub fn test_auth_state(config: AuthConfig) -> AuthState {
        let password_service =
            PasswordService::with_cost(1024, 1).expect("test password parameters are valid");
        AuthState::new(config, password_service)
    }

    /// Convenience helpers for seeding the auth and book tables in tests.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        /// Create a fixture helper bound to the provided pool.
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert a user row, returning the new user id.
        pub async fn insert_user(
            &self,
            email: &str,
            password_hash: &str,
        ) -> Result<i32, sqlx::Error> {
            sqlx::query_scalar(
                "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id",
            )
            .bind(email)
            .bind(password_hash)
            .fetch_one(self.pool)
            .await
        }

        /// Insert a book owned by `owner_id`, returning its id.
        pub async fn insert_book(
            &self,
            owner_id: i32,
            title: &str,
            author: &str,
        ) -> Result<i32, sqlx::Error> {
            sqlx::query_scalar(
                "INSERT INTO books (title, author, owner_id) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(title)
            .bind(author)
            .bind(owner_id)
            .fetch_one(self.pool)
            .await
        }
    }

    pub mod database {
        use log::LevelFilter;
        use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use sqlx::{ConnectOptions, PgPool};
        use testcontainers::{GenericImage, ImageExt, core::WaitFor};
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container runtime unavailable: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral database factory for integration tests.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<GenericImage>>,
        }

        impl TestDatabase {
            /// Provision a fresh database by launching a disposable Postgres container.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let image = GenericImage::new("postgres", "16-alpine")
                    .with_wait_for(WaitFor::message_on_stderr(
                        "database system is ready to accept connections",
                    ));

                let request = image
                    .with_env_var("POSTGRES_DB", "postgres")
                    .with_env_var("POSTGRES_USER", "postgres")
                    .with_env_var("POSTGRES_PASSWORD", "postgres");

                let container = request.start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let admin_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let base_options: PgConnectOptions =
                    admin_url.parse().map_err(TestDatabaseError::Sqlx)?;
                let base_options = base_options.log_statements(LevelFilter::Off);

                let admin_options = base_options.clone().database("postgres");
                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                let new_db_name = format!("books_{}", Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", new_db_name);
                sqlx::query(&create_sql)
                    .execute(&admin_pool)
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.clone().database(&new_db_name))
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name: new_db_name,
                    container: Some(container),
                })
            }

            /// Cloneable connection pool for use in tests and Rocket state.
            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            /// Convenience method returning a clone of the pooled connection handle.
            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database(self.admin_options.clone(), &self.database_name)
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                if let Some(container) = self.container.take() {
                    drop(container);
                }

                Ok(())
            }
        }

        async fn drop_database(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            let drop_sql = format!("DROP DATABASE \"{}\" WITH (FORCE)", database_name);
            sqlx::query(&drop_sql).execute(&admin_pool).await?;
            Ok(())
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                if let Some(pool) = self.pool.take() {
                    let admin_options = self.admin_options.clone();
                    let db_name = self.database_name.clone();
                    if let Ok(handle) = Handle::try_current() {
                        handle.spawn(async move {
                            pool.close().await;
                            let _ = drop_database(admin_options, &db_name).await;
                        });
                    }
                }

                if let Some(container) = self.container.take() {
                    drop(container);
                }
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        auth_config: AuthConfig,
        users: Option<UserStore>,
        books: Option<BookStore>,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging
        /// disabled, in-memory stores.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                auth_config: AuthConfig::new(TEST_JWT_SECRET),
                users: None,
                books: None,
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api/v1".to_string(), routes));
            self
        }

        /// Override the auth configuration used for the managed [`AuthState`].
        pub fn auth_config(mut self, config: AuthConfig) -> Self {
            self.auth_config = config;
            self
        }

        /// Back the routes with Postgres instead of the in-memory stores.
        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.users = Some(Arc::new(PgCredentialStore::new(pool.clone())));
            self.books = Some(Arc::new(PgBookRepository::new(pool)));
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment).register("/", crate::error::catchers());

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            let users = self
                .users
                .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new()));
            let books = self
                .books
                .unwrap_or_else(|| Arc::new(MemoryBookRepository::new()));

            rocket
                .manage(test_auth_state(self.auth_config))
                .manage(users)
                .manage(books)
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }

    /// Register `email` with `password` through the API.
    pub fn register_user(client: &Client, email: &str, password: &str) -> PublicUser {
        let response = client
            .post("/api/v1/auth/register")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "password": password }).to_string())
            .dispatch();
        assert_eq!(response.status(), Status::Ok, "register {email}");
        response.into_json().expect("register response")
    }

    /// Log in through the API and return the bearer token.
    pub fn login_token(client: &Client, email: &str, password: &str) -> String {
        let response = client
            .post("/api/v1/auth/login")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "password": password }).to_string())
            .dispatch();
        assert_eq!(response.status(), Status::Ok, "login {email}");
        response
            .into_json::<LoginResponse>()
            .expect("login response")
            .token
    }

    /// `Authorization` header carrying `token`.
    pub fn bearer(token: &str) -> Header<'static> {
        Header::new("Authorization", format!("Bearer {token}"))
    }
}
