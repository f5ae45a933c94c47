//! Short-lived page cache shielding the rate-limited provider.
//!
//! The gateway depends on the [`ResponseCache`] trait rather than a global,
//! so the cache can be replaced (shared, distributed) or disabled with
//! [`NoCache`]. Timestamps use `tokio::time::Instant` so paused-clock tests
//! can move past the TTL.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::{PageRequest, PhotoPage};

/// Get/set storage for successful page payloads.
pub trait ResponseCache: Send + Sync {
    /// Fresh payload for `key`, if any.
    fn get(&self, key: &PageRequest) -> Option<PhotoPage>;

    /// Store a successful payload. Never called for errors.
    fn set(&self, key: PageRequest, page: PhotoPage);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    page: PhotoPage,
    created_at: Instant,
}

/// In-process cache with TTL-based staleness and no other eviction.
///
/// Entry count is bounded by the page × filter combinations actually
/// requested. Stale entries are overwritten on the next successful fetch.
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<PageRequest, CacheEntry>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PageRequest, CacheEntry>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResponseCache for TtlCache {
    fn get(&self, key: &PageRequest) -> Option<PhotoPage> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        // An entry exactly TTL old is still fresh.
        if entry.created_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.page.clone())
    }

    fn set(&self, key: PageRequest, page: PhotoPage) {
        self.lock().insert(
            key,
            CacheEntry {
                page,
                created_at: Instant::now(),
            },
        );
    }
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResponseCache for NoCache {
    fn get(&self, _key: &PageRequest) -> Option<PhotoPage> {
        None
    }

    fn set(&self, _key: PageRequest, _page: PhotoPage) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilterSet;

    fn key(page: u32) -> PageRequest {
        PageRequest::new(page, 20, FilterSet::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_until_ttl_elapses() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(key(1), PhotoPage::default());

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(cache.get(&key(1)).is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get(&key(1)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_refreshes_timestamp() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(key(1), PhotoPage::default());
        tokio::time::advance(Duration::from_secs(90)).await;
        assert!(cache.get(&key(1)).is_none());

        cache.set(key(1), PhotoPage::default());
        assert!(cache.get(&key(1)).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(key(1), PhotoPage::default());
        assert!(cache.get(&key(2)).is_none());
    }

    #[test]
    fn test_no_cache_never_hits() {
        let cache = NoCache;
        cache.set(key(1), PhotoPage::default());
        assert!(cache.get(&key(1)).is_none());
    }
}
