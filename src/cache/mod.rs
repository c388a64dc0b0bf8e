// 缓存模块
// 仪表盘缓存、令牌撤销、管理后台会话和限流计数共用同一个键值存储

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod session;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use session::{CachedSession, SessionCacheOperations};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 带过期时间的键值存储
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, keys: &[&str]) -> Result<(), CacheError>;

    /// 计数加一并返回新值，窗口内第一次计数时设置过期时间
    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheError>;
}

/// 已撤销令牌的记录，条目在令牌自身过期后即可丢弃
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn revoke(&self, jti: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn is_revoked(&self, jti: &str) -> Result<bool, CacheError>;
}

pub async fn get_json<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match store.get(key).await? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize>(
    store: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError> {
    let json = serde_json::to_string(value)?;
    store.set_ex(key, json, ttl).await
}

/// Redis 的 SETEX 不接受 0 秒
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
