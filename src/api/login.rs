use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::auth::{create_access_token, verify_dummy_password, verify_password, Token};
use crate::tables::User;
use crate::LOGIN_API;
use axum::{extract::State, routing::post, Form, Json, Router};
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// OAuth2 password-flow form fields.
#[derive(Deserialize, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub fn create_router() -> Router<AppState> {
    Router::new().route(
        format!("/{LOGIN_API}/token").as_str(),
        post(login_for_access_token),
    )
}

/// Returns the user only when `password` matches the stored hash. An unknown
/// username still costs one argon2 verification.
pub fn authenticate_user(
    conn: &mut PgConnection,
    username: &str,
    password: &str,
) -> ApiResult<Option<User>> {
    let Some(user) = User::find_by_username(conn, username)? else {
        verify_dummy_password(password);
        return Ok(None);
    };

    let matches = verify_password(password, &user.hashed_password)
        .map_err(|e| ApiError::InternalServerError(format!("Unreadable password hash: {e}")))?;

    Ok(matches.then_some(user))
}

async fn login_for_access_token(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<Token>> {
    let mut conn = state.conn()?;

    let user = authenticate_user(&mut conn, &form.username, &form.password)?.ok_or_else(|| {
        warn!("Failed login attempt for {}", form.username);
        ApiError::BadRequest("Incorrect username or password".to_string())
    })?;

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    let access_token = create_access_token(user.id, &state.jwt())
        .map_err(|e| ApiError::InternalServerError(format!("Token encoding failed: {e}")))?;

    info!("Issued access token for {}", user.username);
    Ok(Json(Token::bearer(access_token)))
}
