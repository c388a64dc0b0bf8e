use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::keys::revoked_token_key;
use super::{CacheError, CacheStore, RevocationStore};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// 每写入这么多次清理一遍过期条目
const PURGE_EVERY: u64 = 256;

/// 进程内存储，未配置 Redis 时使用，也用于测试
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn purge_expired(entries: &mut HashMap<String, Entry>, now: Instant) {
        entries.retain(|_, entry| entry.is_live(now));
    }

    /// 写入新条目，从不再读取的键（限流计数、废弃会话）靠这里定期清理
    fn insert(
        &self,
        entries: &mut HashMap<String, Entry>,
        key: String,
        entry: Entry,
        now: Instant,
    ) {
        if self.writes.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            Self::purge_expired(entries, now);
        }
        entries.insert(key, entry);
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries();
        let entry = Entry {
            value,
            expires_at: now + ttl,
        };
        self.insert(&mut entries, key.to_string(), entry, now);
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), CacheError> {
        let mut entries = self.entries();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }

    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries();

        let count = match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                let count = entry.value.parse::<u64>().unwrap_or(0) + 1;
                entry.value = count.to_string();
                count
            }
            _ => {
                let entry = Entry {
                    value: "1".into(),
                    expires_at: now + window,
                };
                self.insert(&mut entries, key.to_string(), entry, now);
                1
            }
        };

        Ok(count)
    }
}

#[async_trait]
impl RevocationStore for MemoryStore {
    async fn revoke(&self, jti: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries();
        // 撤销记录只会增长，写入时顺便清理过期条目
        Self::purge_expired(&mut entries, now);
        entries.insert(
            revoked_token_key(jti),
            Entry {
                value: "1".into(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, CacheError> {
        Ok(self.get(&revoked_token_key(jti)).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_expire_after_ttl() {
        let store = MemoryStore::new();
        store
            .set_ex("live", "a".into(), Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set_ex("dead", "b".into(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(store.get("live").await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.get("dead").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_every_listed_key() {
        let store = MemoryStore::new();
        for key in ["a", "b", "c"] {
            store
                .set_ex(key, key.into(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        store.delete(&["a", "b", "missing"]).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), None);
        assert_eq!(store.get("c").await.unwrap().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn window_counter_restarts_after_expiry() {
        let store = MemoryStore::new();
        let window = Duration::from_secs(60);
        assert_eq!(store.incr_window("k", window).await.unwrap(), 1);
        assert_eq!(store.incr_window("k", window).await.unwrap(), 2);

        assert_eq!(store.incr_window("z", Duration::ZERO).await.unwrap(), 1);
        assert_eq!(store.incr_window("z", Duration::ZERO).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn revoked_tokens_are_remembered_until_ttl() {
        let store = MemoryStore::new();
        store.revoke("jti-1", Duration::from_secs(60)).await.unwrap();
        store.revoke("jti-2", Duration::ZERO).await.unwrap();

        assert!(store.is_revoked("jti-1").await.unwrap());
        assert!(!store.is_revoked("jti-2").await.unwrap());
        assert!(!store.is_revoked("unknown").await.unwrap());
    }

    #[tokio::test]
    async fn expired_entries_are_purged_on_write() {
        let store = MemoryStore::new();
        store
            .set_ex("session", "s".into(), Duration::from_secs(60))
            .await
            .unwrap();

        for i in 0..10_000 {
            store
                .incr_window(&format!("rate_limit:{}", i), Duration::ZERO)
                .await
                .unwrap();
        }

        let remaining = store.entries().len();
        assert!(remaining <= PURGE_EVERY as usize, "{} entries left", remaining);
        assert_eq!(store.get("session").await.unwrap().as_deref(), Some("s"));
    }
}
