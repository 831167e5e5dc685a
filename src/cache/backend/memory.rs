use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheBackend, CacheError, ttl_secs};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// 进程内带 TTL 的缓存后端，未配置 Redis 时使用
#[derive(Debug, Default)]
pub struct MemoryCache {
    store: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 清理过期条目，返回清理数量
    pub async fn purge_expired(&self) -> usize {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired());
        before - store.len()
    }

    /// 当前保留的条目数（含尚未清理的过期条目）
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// 后台定期清理，由 main 在使用进程内缓存时启动
    pub async fn run_purge(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let purged = self.purge_expired().await;
            if purged > 0 {
                tracing::debug!("Purged {} expired memory cache entries", purged);
            }
        }
    }

    /// 读到过期条目时顺手删除
    async fn evict_if_expired(&self, key: &str) {
        let mut store = self.store.write().await;
        if store.get(key).is_some_and(Entry::is_expired) {
            store.remove(key);
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        {
            let store = self.store.read().await;
            match store.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }
        self.evict_if_expired(key).await;
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs(ttl));
        let mut store = self.store.write().await;
        store.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let expired = {
            let store = self.store.read().await;
            match store.get(key) {
                None => return Ok(false),
                Some(entry) => entry.is_expired(),
            }
        };
        if expired {
            self.evict_if_expired(key).await;
        }
        Ok(!expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set_ex("facility:wydm9qy:police", "[]".into(), Duration::from_secs(1))
            .await
            .unwrap();

        assert!(cache.exists("facility:wydm9qy:police").await.unwrap());
        assert_eq!(
            cache.get("facility:wydm9qy:police").await.unwrap().as_deref(),
            Some("[]")
        );

        tokio::time::advance(Duration::from_millis(1001)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert!(!cache.exists("facility:wydm9qy:police").await.unwrap());
        assert_eq!(cache.get("facility:wydm9qy:police").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn reading_expired_entries_frees_them() {
        let cache = MemoryCache::new();
        for i in 0..1000 {
            cache
                .set_ex(&format!("analysis:cell{i}:500"), "{}".into(), Duration::from_secs(1))
                .await
                .unwrap();
        }
        cache
            .set_ex("facility:wydm9qy:police", "[]".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.len().await, 1001);

        tokio::time::advance(Duration::from_secs(5)).await;

        for i in 0..1000 {
            assert_eq!(cache.get(&format!("analysis:cell{i}:500")).await.unwrap(), None);
        }
        assert_eq!(cache.len().await, 1);
        assert!(cache.exists("facility:wydm9qy:police").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn exists_on_expired_entry_frees_it() {
        let cache = MemoryCache::new();
        cache
            .set_ex("arrest_rate:중구", "0.8".into(), Duration::from_secs(1))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(!cache.exists("arrest_rate:중구").await.unwrap());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn background_purge_drops_unread_entries() {
        let cache = Arc::new(MemoryCache::new());
        for i in 0..10 {
            cache
                .set_ex(&format!("facility:cell{i}:cctv"), "[]".into(), Duration::from_secs(1))
                .await
                .unwrap();
        }
        let purge = tokio::spawn(cache.clone().run_purge(Duration::from_secs(30)));

        tokio::time::sleep(Duration::from_secs(31)).await;

        assert!(cache.is_empty().await);
        purge.abort();
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope").await.unwrap(), None);
        assert!(!cache.exists("nope").await.unwrap());
    }
}
