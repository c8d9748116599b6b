use crate::api::state::Pool;
use crate::config::Settings;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel::QueryResult;
use tracing::info;

const CREATE_TABLES_SQL: &str =
    include_str!("../migrations/2024-11-01-000000_create_notekeeper_tables/up.sql");

pub fn establish_pool(settings: &Settings) -> Result<Pool, r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(&settings.database_url);
    let pool = r2d2::Pool::builder()
        .max_size(settings.database_pool_size)
        .build(manager)?;

    info!("Database pool ready (max {} connections)", settings.database_pool_size);
    Ok(pool)
}

/// Creates every table and index that does not exist yet.
pub fn create_tables(conn: &mut PgConnection) -> QueryResult<()> {
    conn.batch_execute(CREATE_TABLES_SQL)?;
    info!("Database schema is up to date");
    Ok(())
}
