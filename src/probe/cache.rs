//! Session-scoped result cache.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::target::ProbeStatus;

/// Roughly thirty years; used when a ttl overflows the clock.
const FAR_FUTURE_SECS: u64 = 86_400 * 365 * 30;

#[derive(Debug, Clone)]
struct CacheEntry {
    status: ProbeStatus,
    expires_at: Instant,
}

/// Last known status per URL with a freshness window.
///
/// Expiry is lazy: stale entries are removed when read, never swept.
#[derive(Debug)]
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl ResultCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Fresh status for `url`, if any.
    pub fn get(&self, url: &str) -> Option<ProbeStatus> {
        let now = Instant::now();
        let hit = match self.entries.get(url) {
            Some(entry) if now < entry.expires_at => Some(entry.status.clone()),
            Some(_) => None,
            None => {
                metrics::record_cache_lookup(false);
                return None;
            }
        };

        if hit.is_none() {
            self.entries.remove_if(url, |_, entry| now >= entry.expires_at);
        }
        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    /// Store `status` for `ttl`. A ttl beyond the clock's range never expires.
    pub fn put(&self, url: &str, status: ProbeStatus, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS));
        self.entries.insert(url.to_string(), CacheEntry { status, expires_at });
    }

    pub fn invalidate(&self, url: &str) {
        self.entries.remove(url);
    }

    /// Number of stored entries, including ones not yet lazily expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::UnreachableReason;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_within_window() {
        let cache = ResultCache::new(TTL);
        cache.put("https://a.example", ProbeStatus::Reachable, TTL);

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("https://a.example"), Some(ProbeStatus::Reachable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl_and_is_removed_on_read() {
        let cache = ResultCache::new(TTL);
        cache.put("https://a.example", ProbeStatus::Reachable, TTL);

        tokio::time::advance(TTL).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("https://a.example"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_does_not_overflow() {
        let cache = ResultCache::new(Duration::MAX);
        cache.put("https://c.example", ProbeStatus::Reachable, Duration::MAX);

        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert_eq!(cache.get("https://c.example"), Some(ProbeStatus::Reachable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_and_overwrite() {
        let cache = ResultCache::new(TTL);
        let url = "https://b.example";
        cache.put(url, ProbeStatus::Reachable, TTL);
        cache.put(url, ProbeStatus::unreachable(UnreachableReason::Timeout), TTL);
        assert_eq!(
            cache.get(url),
            Some(ProbeStatus::unreachable(UnreachableReason::Timeout))
        );

        cache.invalidate(url);
        assert_eq!(cache.get(url), None);
    }
}
