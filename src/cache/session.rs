use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::keys::session_key;
use super::{CacheError, CacheStore, get_json, set_json};

/// 管理后台会话缓存数据
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CachedSession {
    pub user_id: i64,
    pub created_at: i64, // Unix timestamp
    pub expires_at: i64, // Unix timestamp
}

/// 会话缓存操作
/// 存储中只保存会话ID的 SHA-256 摘要，原始ID只出现在 Cookie 中
pub struct SessionCacheOperations;

impl SessionCacheOperations {
    /// 创建会话并返回会话ID
    pub async fn create_session(
        store: &dyn CacheStore,
        user_id: i64,
        ttl: Duration,
    ) -> Result<String, CacheError> {
        let session_id = Uuid::new_v4().simple().to_string();
        let now = Utc::now().timestamp();

        let session = CachedSession {
            user_id,
            created_at: now,
            expires_at: now + ttl.as_secs() as i64,
        };

        set_json(store, &Self::key(&session_id), &session, ttl).await?;

        Ok(session_id)
    }

    /// 获取会话
    pub async fn get_session(
        store: &dyn CacheStore,
        session_id: &str,
    ) -> Result<Option<CachedSession>, CacheError> {
        let session: Option<CachedSession> = get_json(store, &Self::key(session_id)).await?;
        Ok(session.filter(|s| s.expires_at > Utc::now().timestamp()))
    }

    /// 删除会话
    pub async fn remove_session(store: &dyn CacheStore, session_id: &str) -> Result<(), CacheError> {
        store.delete(&[Self::key(session_id).as_str()]).await
    }

    fn key(session_id: &str) -> String {
        session_key(&format!("{:x}", Sha256::digest(session_id.as_bytes())))
    }
}
