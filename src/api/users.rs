use super::error::{ApiError, ApiResult};
use super::extract::{CurrentUser, SuperUser};
use super::state::AppState;
use crate::auth::hash_password;
use crate::config::Settings;
use crate::tables::{NewUser, User};
use crate::validation::{
    validate_email, validate_length, validate_password, DEFAULT_LIMIT, DEFAULT_SKIP,
    MAX_NAME_LEN, MIN_NAME_LEN,
};
use crate::USERS_API;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Deserialize, Serialize, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            format!("/{USERS_API}").as_str(),
            get(list_users).post(create_user),
        )
        .route(format!("/{USERS_API}/me").as_str(), get(read_current_user))
        .route(
            format!("/{USERS_API}/:id").as_str(),
            get(get_user).delete(delete_user),
        )
}

/// Validates and stores a new user with a freshly hashed password.
pub fn insert_user(conn: &mut PgConnection, request: &CreateUserRequest) -> ApiResult<User> {
    use crate::schema::users;

    validate_length("username", &request.username, MIN_NAME_LEN, MAX_NAME_LEN)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    for (field, value) in [
        ("first_name", &request.first_name),
        ("last_name", &request.last_name),
    ] {
        if let Some(v) = value {
            validate_length(field, v, 0, MAX_NAME_LEN)?;
        }
    }

    let hashed = hash_password(&request.password)
        .map_err(|e| ApiError::InternalServerError(format!("Password hashing failed: {e}")))?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        username: &request.username,
        email: &request.email,
        hashed_password: &hashed,
        first_name: request.first_name.as_deref(),
        last_name: request.last_name.as_deref(),
        is_active: true,
        is_superuser: request.is_superuser,
    };

    let user = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(conn)?;

    info!("Created user {} ({})", user.username, user.id);
    Ok(user)
}

/// Creates the configured first superuser unless a user with that name exists.
pub fn create_first_superuser(conn: &mut PgConnection, settings: &Settings) -> ApiResult<Option<User>> {
    let Some(first) = &settings.first_superuser else {
        return Ok(None);
    };

    if User::find_by_username(conn, &first.username)?.is_some() {
        return Ok(None);
    }

    let request = CreateUserRequest {
        username: first.username.clone(),
        email: first.email.clone(),
        password: first.password.clone(),
        first_name: None,
        last_name: None,
        is_superuser: true,
    };
    insert_user(conn, &request).map(Some)
}

async fn list_users(
    State(state): State<AppState>,
    _admin: SuperUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let skip = params.skip.unwrap_or(DEFAULT_SKIP).max(0);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(0, DEFAULT_LIMIT);

    let mut conn = state.conn()?;
    let users = User::get_page(&mut conn, skip, limit)?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

async fn create_user(
    State(state): State<AppState>,
    _admin: SuperUser,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let mut conn = state.conn()?;
    let user = insert_user(&mut conn, &payload)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn read_current_user(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

async fn get_user(
    State(state): State<AppState>,
    _admin: SuperUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let mut conn = state.conn()?;
    let user = User::get_by_id(&mut conn, user_id)?.ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    _admin: SuperUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    use crate::schema::users::dsl::*;

    let mut conn = state.conn()?;
    let deleted = diesel::delete(users.find(user_id)).execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("User"));
    }
    info!("Deleted user {}", user_id);
    Ok(StatusCode::NO_CONTENT)
}
