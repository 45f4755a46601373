//! In-process key-value cache with TTL expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Error, KvCache};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory cache for hostname mappings.
///
/// Uses a HashMap behind a tokio RwLock; clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryKvCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryKvCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries.
    ///
    /// Returns the number of removed entries.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    /// Number of entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvCache for MemoryKvCache {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).filter(|entry| !entry.is_expired()).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| Error::InvalidInput(format!("ttl out of range: {ttl:?}")))?;
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry { value: value.to_string(), expires_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryKvCache::new();
        cache.set("subdomain:acme", "site_42", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("subdomain:acme").await.unwrap().as_deref(), Some("site_42"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = MemoryKvCache::new();
        assert!(cache.get("domain:nowhere.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let cache = MemoryKvCache::new();
        cache.set("domain:a.com", "site_1", Duration::ZERO).await.unwrap();
        assert!(cache.get("domain:a.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = MemoryKvCache::new();
        cache.set("domain:a.com", "site_1", Duration::from_secs(60)).await.unwrap();
        cache.set("domain:a.com", "site_2", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("domain:a.com").await.unwrap().as_deref(), Some("site_2"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let cache = MemoryKvCache::new();
        cache.set("domain:old.com", "site_1", Duration::ZERO).await.unwrap();
        cache.set("domain:new.com", "site_2", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.cleanup_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(!cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = MemoryKvCache::new();
        let other = cache.clone();
        cache.set("subdomain:acme", "site_42", Duration::from_secs(60)).await.unwrap();
        assert_eq!(other.get("subdomain:acme").await.unwrap().as_deref(), Some("site_42"));
    }

    #[tokio::test]
    async fn test_set_rejects_unrepresentable_ttl() {
        let cache = MemoryKvCache::new();
        let result = cache.set("domain:a.com", "site_1", Duration::from_secs(u64::MAX)).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(cache.is_empty().await);
    }
}
