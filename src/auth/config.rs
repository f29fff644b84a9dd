use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Tokens live for one hour from issuance.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Authentication settings, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    /// Report unknown emails as `InvalidCredentials` instead of `UserNotFound`.
    pub unify_login_errors: bool,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            unify_login_errors: false,
        }
    }

    /// Read the auth section of the configuration, appending every problem to
    /// `issues` instead of stopping at the first one.
    pub(crate) fn from_lookup<F>(lookup: &F, issues: &mut Vec<String>) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = match lookup("JWT_SECRET") {
            None => {
                issues.push("JWT_SECRET: required to sign and verify tokens".into());
                None
            }
            Some(secret) if secret.is_empty() || STANDARD.decode(&secret).is_err() => {
                issues.push("JWT_SECRET: must be a base64 string".into());
                None
            }
            Some(secret) => Some(secret),
        };

        let unify_login_errors = match lookup("LOGIN_UNIFIED_ERRORS") {
            None => false,
            Some(value) => match parse_flag(&value) {
                Some(flag) => flag,
                None => {
                    issues.push(format!("LOGIN_UNIFIED_ERRORS: '{value}' is not a boolean"));
                    false
                }
            },
        };

        jwt_secret.map(|jwt_secret| Self {
            jwt_secret,
            access_token_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            unify_login_errors,
        })
    }
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "on" => Some(true),
        "0" | "false" | "FALSE" | "no" | "off" => Some(false),
        _ => None,
    }
}
