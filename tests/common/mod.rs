#![allow(dead_code)]

use axum::http::{header, HeaderName, HeaderValue};
use diesel::prelude::*;
use notekeeper_api::api::{self, users::insert_user, CreateUserRequest, Pool};
use notekeeper_api::config::Settings;
use notekeeper_api::db;
use notekeeper_api::tables::User;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Settings pointing at `DATABASE_URL`, or `None` when it is not set and the
/// database tests should be skipped.
pub fn test_settings() -> Option<Settings> {
    dotenv::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    Settings::from_lookup(|key| match key {
        "ENVIRONMENT" => Some("development".to_string()),
        "DATABASE_URL" => Some(database_url.clone()),
        "LOG_LEVEL" => Some("debug".to_string()),
        "SECRET_KEY" => Some("integration-test-secret".to_string()),
        "DATABASE_POOL_SIZE" => Some("4".to_string()),
        _ => None,
    })
    .ok()
}

pub fn test_pool(settings: &Settings) -> Pool {
    let pool = db::establish_pool(settings).expect("Failed to create pool");
    let mut conn = pool.get().expect("Failed to get connection");
    db::create_tables(&mut conn).expect("Failed to create tables");
    pool
}

/// Deletes the test users when dropped; their notes, folders and tags
/// cascade with them.
pub struct TestCleanup {
    pub pool: Pool,
    pub user_ids: Vec<Uuid>,
}

impl Drop for TestCleanup {
    fn drop(&mut self) {
        use notekeeper_api::schema::users::dsl::*;

        if let Ok(mut conn) = self.pool.get() {
            let _ = diesel::delete(users.filter(id.eq_any(self.user_ids.clone()))).execute(&mut conn);
        }
    }
}

pub fn create_test_user(cleanup: &mut TestCleanup, is_superuser: bool) -> User {
    let mut conn = cleanup.pool.get().expect("Failed to get connection");
    let suffix = Uuid::new_v4().simple().to_string();
    let request = CreateUserRequest {
        username: format!("user_{}", &suffix[..12]),
        email: format!("{}@example.com", &suffix[..12]),
        password: TEST_PASSWORD.to_string(),
        first_name: None,
        last_name: None,
        is_superuser,
    };

    let user = insert_user(&mut conn, &request).expect("Failed to create user");
    cleanup.user_ids.push(user.id);
    user
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("token is a valid header"),
    )
}

pub fn router(pool: &Pool, settings: &Settings) -> axum::Router {
    api::create_router(pool.clone(), settings.clone())
}
