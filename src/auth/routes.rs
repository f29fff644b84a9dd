use rocket::serde::json::Json;
use rocket::{State, post};
use rocket_okapi::openapi;

use crate::auth::responses::{LoginRequest, LoginResponse, RegisterRequest};
use crate::auth::{AuthState, accounts};
use crate::error::{ApiError, ApiResult};
use crate::models::PublicUser;
use crate::store::UserStore;

/// Create an account. Responds with the new user's id and email.
#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<payload>")]
pub async fn register(
    state: &State<AuthState>,
    users: &State<UserStore>,
    payload: Json<RegisterRequest>,
) -> ApiResult<Json<PublicUser>> {
    let registration = payload.into_inner().validate().map_err(ApiError::from)?;
    let user = accounts::register(state, users.inner().as_ref(), registration).await?;
    Ok(Json(user))
}

/// Exchange email and password for a bearer token valid for one hour.
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    users: &State<UserStore>,
    payload: Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let credentials = payload.into_inner().validate().map_err(ApiError::from)?;
    let token = accounts::login(state, users.inner().as_ref(), credentials).await?;
    Ok(Json(LoginResponse { token: token.token }))
}
