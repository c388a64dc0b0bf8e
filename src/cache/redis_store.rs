use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use super::keys::revoked_token_key;
use super::{CacheError, CacheStore, RevocationStore, ttl_secs};

/// Redis 存储，每次操作获取一个多路复用连接
#[derive(Clone)]
pub struct RedisStore {
    client: RedisClient,
}

impl RedisStore {
    pub fn open(url: &str) -> Result<Self, CacheError> {
        Ok(RedisStore {
            client: RedisClient::open(url)?,
        })
    }

    /// 启动时检查连接是否可用
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(keys).await?;
        Ok(())
    }

    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let count: u64 = conn.incr(key, 1).await?;
        // 第一次计数时设置窗口过期时间
        if count == 1 {
            let _: () = conn.expire(key, ttl_secs(window) as i64).await?;
        }

        Ok(count)
    }
}

#[async_trait]
impl RevocationStore for RedisStore {
    async fn revoke(&self, jti: &str, ttl: Duration) -> Result<(), CacheError> {
        self.set_ex(&revoked_token_key(jti), "1".into(), ttl).await
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let exists: bool = conn.exists(revoked_token_key(jti)).await?;
        Ok(exists)
    }
}
