use crate::auth::JwtConfig;
use crate::config::{HierarchyPolicy, Settings};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};
use std::sync::Arc;

// Connection pool type
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PoolConnection = PooledConnection<ConnectionManager<PgConnection>>;

// Shared state
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<Pool>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pool: Pool, settings: Settings) -> Self {
        Self {
            pool: Arc::new(pool),
            settings: Arc::new(settings),
        }
    }

    pub fn conn(&self) -> Result<PoolConnection, r2d2::PoolError> {
        self.pool.get()
    }

    pub fn jwt(&self) -> JwtConfig {
        JwtConfig::from(self.settings.as_ref())
    }

    pub fn hierarchy_policy(&self) -> &HierarchyPolicy {
        &self.settings.hierarchy
    }
}
