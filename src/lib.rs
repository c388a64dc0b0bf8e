use std::sync::Arc;

use sqlx::SqlitePool;

use cache::{CacheStore, RevocationStore};
use config::Config;
use dashboard::DashboardCache;

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub cache: Arc<dyn CacheStore>,
    pub revocations: Arc<dyn RevocationStore>,
}

impl AppState {
    /// 缓存和令牌撤销共用同一个存储
    pub fn with_store<S>(pool: SqlitePool, config: Config, store: Arc<S>) -> Self
    where
        S: CacheStore + RevocationStore + 'static,
    {
        Self {
            pool,
            config,
            cache: store.clone(),
            revocations: store,
        }
    }

    pub fn dashboard(&self) -> DashboardCache {
        DashboardCache::new(self.pool.clone(), self.cache.clone())
    }
}
