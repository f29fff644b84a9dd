use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket_okapi::request::OpenApiFromRequest;

use crate::auth::{AuthError, AuthResult, AuthState, TokenIdentity};

/// Identity of the caller, available to a handler for one request.
///
/// Using this guard is what makes a route protected: the token is checked
/// here and nowhere else.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
}

impl From<TokenIdentity> for AuthUser {
    fn from(identity: TokenIdentity) -> Self {
        Self {
            id: identity.user_id,
            email: identity.email,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_user(request).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => {
                if err.is_internal() {
                    log::error!("auth guard failed: {}", err);
                    Outcome::Error((err.status(), err))
                } else {
                    log::debug!("rejected request to {}: {}", request.uri(), err);
                    Outcome::Error((Status::Unauthorized, AuthError::Unauthenticated))
                }
            }
        }
    }
}

async fn extract_user(request: &Request<'_>) -> AuthResult<AuthUser> {
    // No header means no token service call at all.
    let token = bearer_token(request.headers().get_one("Authorization"))
        .ok_or(AuthError::Unauthenticated)?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let identity = auth_state.token_service.verify(token)?;
    Ok(AuthUser::from(identity))
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
