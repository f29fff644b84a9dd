use std::io::{self, Write};

use clap::Parser;

use book_api::auth::responses::RegisterRequest;
use book_api::auth::{AuthError, AuthState, accounts};
use book_api::config::AppConfig;
use book_api::db;
use book_api::store::PgCredentialStore;

#[derive(Parser, Debug)]
#[command(
    name = "create_user",
    about = "Create a book API user account from the command line"
)]
struct Args {
    /// Email address for the account (case insensitive).
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,

    /// Optional username, 3 to 20 characters.
    #[arg(long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let registration = match (RegisterRequest {
        email: args.email,
        password: args.password,
        username: args.username,
    })
    .validate()
    {
        Ok(registration) => registration,
        Err(errors) => {
            for error in errors {
                writeln!(io::stderr(), "error: {}: {}", error.field, error.message)?;
            }
            std::process::exit(1);
        }
    };

    let config = AppConfig::from_env()?;
    let pool = db::connect_lazy(&config.database)?;
    db::run_migrations(&pool).await?;

    let state = AuthState::from_config(config.auth)?;
    let users = PgCredentialStore::new(pool.clone());

    match accounts::register(&state, &users, registration).await {
        Ok(user) => {
            println!("Created user '{}' with id {}", user.email, user.id);
        }
        Err(AuthError::DuplicateEmail) => {
            writeln!(io::stderr(), "error: a user with that email already exists.")?;
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    }

    pool.close().await;
    Ok(())
}
