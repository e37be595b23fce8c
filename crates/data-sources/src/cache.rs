//! Time-bounded result cache keyed by rounded coordinates

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-memory cache with per-entry expiry.
///
/// Shared between clients through an `Arc`; never a global.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cache key from coordinates (rounded to 2 decimal places)
    pub fn coordinate_key(lat: f64, lng: f64) -> String {
        format!("{:.2},{:.2}", lat, lng)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unexpired value for `key`
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone())
    }

    /// Store `value` and drop every entry whose TTL has lapsed
    pub async fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// `(total, unexpired)` entry counts
    pub async fn stats(&self) -> (usize, usize) {
        let entries = self.entries.read().await;
        let now = Instant::now();
        let valid = entries.values().filter(|e| e.expires_at > now).count();
        (entries.len(), valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_key() {
        assert_eq!(TtlCache::<f64>::coordinate_key(40.71284, -74.00601), "40.71,-74.01");
        assert_eq!(
            TtlCache::<f64>::coordinate_key(40.714, -74.006),
            TtlCache::<f64>::coordinate_key(40.711, -74.009)
        );
    }

    #[tokio::test]
    async fn test_insert_get_clear() {
        let cache = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("a").await, None);

        cache.insert("a".to_string(), 21.5).await;
        assert_eq!(cache.get("a").await, Some(21.5));
        assert_eq!(cache.stats().await, (1, 1));

        cache.clear().await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.stats().await, (0, 0));
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.insert("a".to_string(), vec![1, 2, 3]).await;
        assert!(cache.get("a").await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.stats().await, (1, 0));
    }

    #[tokio::test]
    async fn test_insert_evicts_expired_entries() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.insert("40.71,-74.01".to_string(), 1.0).await;
        cache.insert("34.05,-118.24".to_string(), 2.0).await;
        assert_eq!(cache.stats().await, (2, 2));

        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.insert("41.88,-87.63".to_string(), 3.0).await;
        assert_eq!(cache.stats().await, (1, 1));
        assert_eq!(cache.get("41.88,-87.63").await, Some(3.0));
    }
}
