//! Authentication module: configuration, password hashing, token issuance
//! and verification, the bearer-token request guard, and the register/login
//! route handlers.

use std::sync::Arc;

pub mod accounts;
pub mod config;
pub mod error;
pub mod guards;
pub mod jwt;
pub mod passwords;
pub mod responses;
pub mod routes;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use guards::AuthUser;
pub use jwt::{TokenIdentity, TokenService};
pub use passwords::PasswordService;

/// Immutable auth collaborators shared by every request.
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub password_service: Arc<PasswordService>,
    pub token_service: Arc<TokenService>,
}

impl AuthState {
    pub fn new(config: AuthConfig, password_service: PasswordService) -> Self {
        let token_service = TokenService::from_config(&config);
        Self {
            config,
            password_service: Arc::new(password_service),
            token_service: Arc::new(token_service),
        }
    }

    pub fn from_config(config: AuthConfig) -> AuthResult<Self> {
        Ok(Self::new(config, PasswordService::new()?))
    }
}
