//! Postgres connection pool and schema migrations.

use std::str::FromStr;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Build the pool without opening a connection; the first query connects.
///
/// The configured password overrides any password embedded in the URL.
pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.url)?.password(&config.password);
    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_lazy_with(options))
}

/// Run database migrations.
///
/// This is idempotent - migrations that have already been applied will be skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("checking database migration state");

    MIGRATOR.run(pool).await?;

    log::info!("database migrations up to date");
    Ok(())
}
