//! Process configuration, read once at startup.
//!
//! Every variable is checked before anything is reported, so an operator sees
//! the full list of problems in one run.

use thiserror::Error;

use crate::auth::AuthConfig;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub password: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub port: u16,
    pub auth: AuthConfig,
}

#[derive(Debug, Error)]
#[error("invalid environment configuration{}", render_issues(.issues))]
pub struct ConfigError {
    pub issues: Vec<String>,
}

fn render_issues(issues: &[String]) -> String {
    issues
        .iter()
        .map(|issue| format!("\n  ➔ {issue}"))
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut issues = Vec::new();
        let database = DatabaseConfig::from_lookup(&lookup, &mut issues);
        let auth = AuthConfig::from_lookup(&lookup, &mut issues);
        let port = parse_or_default(&lookup, "PORT", DEFAULT_PORT, &mut issues);

        match (database, auth) {
            (Some(database), Some(auth)) if issues.is_empty() => Ok(Self {
                database,
                port,
                auth,
            }),
            _ => Err(ConfigError { issues }),
        }
    }
}

impl DatabaseConfig {
    fn from_lookup<F>(lookup: &F, issues: &mut Vec<String>) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = match lookup("DATABASE_URL") {
            None => {
                issues.push("DATABASE_URL: required".into());
                None
            }
            Some(url) if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) => {
                issues.push("DATABASE_URL: must start with postgres:// or postgresql://".into());
                None
            }
            Some(url) => Some(url),
        };

        let password = match lookup("DATABASE_PASSWORD") {
            Some(password) if !password.is_empty() => Some(password),
            _ => {
                issues.push("DATABASE_PASSWORD: must not be empty".into());
                None
            }
        };

        let max_connections = parse_or_default(
            lookup,
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS,
            issues,
        );

        Some(Self {
            url: url?,
            password: password?,
            max_connections,
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T, issues: &mut Vec<String>) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                issues.push(format!("{key}: '{raw}' is not a valid number"));
                default
            }
        },
    }
}
