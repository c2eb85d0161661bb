//! Token Cache Module
//!
//! Bounded map from raw token string to verified claims, combining LRU eviction
//! with lazy TTL expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};

#[derive(Debug)]
struct CacheState<C> {
    entries: HashMap<String, CacheEntry<C>>,
    lru: LruTracker,
    stats: CacheStats,
}

// == Token Cache ==
/// Verified-claims cache for a single credential type.
///
/// `get` and `put` never fail. A capacity of 0 means unbounded; a `None` TTL
/// means entries never go stale. Stale entries are detected when read and are
/// never returned; there is no background sweep.
#[derive(Debug)]
pub struct TokenCache<C> {
    state: Mutex<CacheState<C>>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl<C> TokenCache<C> {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, 0 for unbounded
    /// * `ttl` - Maximum entry age, `None` for no expiry
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
            }),
            capacity,
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    // == Get ==
    /// Returns the cached claims for `token` if present and not stale.
    ///
    /// A hit refreshes the token's recency. A stale entry is dropped and
    /// reported as absent.
    pub fn get(&self, token: &str) -> Option<Arc<C>> {
        self.get_at(token, Instant::now())
    }

    // == Get If ==
    /// Like `get`, but only returns claims that `accept` approves.
    ///
    /// A rejected entry is dropped while the lock is still held and counted as
    /// stale, so a concurrent `put` of fresh claims is never lost.
    pub fn get_if<F>(&self, token: &str, accept: F) -> Option<Arc<C>>
    where
        F: FnOnce(&C) -> bool,
    {
        self.lookup_at(token, Instant::now(), accept)
    }

    pub(crate) fn get_at(&self, token: &str, now: Instant) -> Option<Arc<C>> {
        self.lookup_at(token, now, |_| true)
    }

    fn lookup_at<F>(&self, token: &str, now: Instant, accept: F) -> Option<Arc<C>>
    where
        F: FnOnce(&C) -> bool,
    {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(entry) = state.entries.get(token) else {
            state.stats.record_miss();
            debug!("Cached token not found");
            return None;
        };

        if entry.is_stale_at(self.ttl, now) {
            state.entries.remove(token);
            state.lru.remove(token);
            state.stats.set_total_entries(state.entries.len());
            state.stats.record_stale();
            debug!("Cached token has expired");
            return None;
        }

        let claims = entry.claims();
        if !accept(claims.as_ref()) {
            state.entries.remove(token);
            state.lru.remove(token);
            state.stats.set_total_entries(state.entries.len());
            state.stats.record_stale();
            debug!("Cached claims rejected");
            return None;
        }

        state.lru.touch(token);
        state.stats.record_hit();
        debug!("Cached token is valid");
        Some(claims)
    }

    // == Put ==
    /// Stores `claims` under `token`, replacing any previous entry.
    ///
    /// Overwriting an existing token does not count against capacity. Inserting
    /// a new token into a full cache evicts the least recently used entry first.
    pub fn put(&self, token: &str, claims: C) {
        self.insert(token, Arc::new(claims));
    }

    /// Same as `put`, for claims the caller already shares.
    pub fn insert(&self, token: &str, claims: Arc<C>) {
        self.insert_at(token, claims, Instant::now());
    }

    #[cfg(test)]
    pub(crate) fn put_at(&self, token: &str, claims: C, now: Instant) {
        self.insert_at(token, Arc::new(claims), now);
    }

    fn insert_at(&self, token: &str, claims: Arc<C>, now: Instant) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let is_overwrite = state.entries.contains_key(token);
        if !is_overwrite && self.capacity > 0 && state.entries.len() >= self.capacity {
            if let Some(evicted) = state.lru.evict_oldest() {
                state.entries.remove(&evicted);
                state.stats.record_eviction();
                debug!(capacity = self.capacity, "Evicted least recently used token");
            }
        }

        state
            .entries
            .insert(token.to_string(), CacheEntry::with_created_at(claims, now));
        state.lru.touch(token);
        state.stats.set_total_entries(state.entries.len());
        debug!(entries = state.entries.len(), "Token added to cache");
    }

    // == Remove ==
    /// Drops the entry for `token`, returning whether one existed.
    pub fn remove(&self, token: &str) -> bool {
        let mut state = self.state.lock();
        let existed = state.entries.remove(token).is_some();
        if existed {
            state.lru.remove(token);
            let total = state.entries.len();
            state.stats.set_total_entries(total);
        }
        existed
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }

    /// Number of stored entries, stale ones included until they are read or evicted.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cache_new() {
        let cache: TokenCache<String> = TokenCache::new(100, Some(Duration::from_secs(300)));
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 100);
        assert_eq!(cache.ttl(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_put_and_get() {
        let cache = TokenCache::new(100, None);

        cache.put("token1", "alice".to_string());

        assert_eq!(cache.get("token1").as_deref().map(String::as_str), Some("alice"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let cache: TokenCache<String> = TokenCache::new(100, None);
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_empty_token_is_valid_key() {
        let cache = TokenCache::new(0, None);
        cache.put("", 7u32);
        assert_eq!(cache.get("").as_deref(), Some(&7));
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let cache = TokenCache::new(1, None);

        cache.put("token1", 1u32);
        cache.put("token1", 2u32);

        assert_eq!(cache.get("token1").as_deref(), Some(&2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_ttl_expiry_is_lazy() {
        let cache = TokenCache::new(0, Some(Duration::from_secs(60)));
        let t0 = Instant::now();

        cache.put_at("token1", 1u32, t0);

        assert!(cache.get_at("token1", t0 + Duration::from_secs(59)).is_some());
        assert_eq!(cache.len(), 1);
        assert!(cache.get_at("token1", t0 + Duration::from_secs(60)).is_none());
        assert_eq!(cache.len(), 0, "stale entry dropped on read");
    }

    #[test]
    fn test_ttl_expiration_real_clock() {
        let cache = TokenCache::new(0, Some(Duration::from_millis(50)));

        cache.put("token1", 1u32);
        assert!(cache.get("token1").is_some());

        thread::sleep(Duration::from_millis(80));

        assert!(cache.get("token1").is_none());
        assert_eq!(cache.stats().stale, 1);
    }

    #[test]
    fn test_overwrite_resets_age() {
        let cache = TokenCache::new(0, Some(Duration::from_secs(10)));
        let t0 = Instant::now();

        cache.put_at("token1", 1u32, t0);
        cache.put_at("token1", 2u32, t0 + Duration::from_secs(8));

        assert_eq!(
            cache.get_at("token1", t0 + Duration::from_secs(12)).as_deref(),
            Some(&2)
        );
    }

    #[test]
    fn test_get_if_rejection_drops_entry() {
        let cache = TokenCache::new(0, None);
        cache.put("token1", 1u32);

        assert!(cache.get_if("token1", |v| *v == 2).is_none());

        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.stale, 1);
    }

    #[test]
    fn test_get_if_accepted_counts_hit() {
        let cache = TokenCache::new(0, None);
        cache.put("token1", 1u32);

        assert_eq!(cache.get_if("token1", |v| *v == 1).as_deref(), Some(&1));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = TokenCache::new(3, None);

        cache.put("key1", 1u32);
        cache.put("key2", 2u32);
        cache.put("key3", 3u32);
        cache.put("key4", 4u32);

        assert_eq!(cache.len(), 3);
        assert!(cache.get("key1").is_none());
        assert!(cache.get("key2").is_some());
        assert!(cache.get("key3").is_some());
        assert!(cache.get("key4").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_lru_touch_on_get() {
        let cache = TokenCache::new(3, None);

        cache.put("key1", 1u32);
        cache.put("key2", 2u32);
        cache.put("key3", 3u32);

        // key1 becomes most recently used, so key2 is evicted next
        cache.get("key1");
        cache.put("key4", 4u32);

        assert!(cache.get("key1").is_some());
        assert!(cache.get("key2").is_none());
    }

    #[test]
    fn test_unbounded_when_capacity_zero() {
        let cache = TokenCache::new(0, None);
        for i in 0..500u32 {
            cache.put(&format!("token{i}"), i);
        }
        assert_eq!(cache.len(), 500);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_remove() {
        let cache = TokenCache::new(0, None);
        cache.put("token1", 1u32);

        assert!(cache.remove("token1"));
        assert!(!cache.remove("token1"));
        assert!(cache.get("token1").is_none());
    }

    #[test]
    fn test_stats() {
        let cache = TokenCache::new(100, None);

        cache.put("token1", 1u32);
        cache.get("token1");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_concurrent_put_and_get() {
        let cache = TokenCache::new(64, None);

        thread::scope(|s| {
            for worker in 0..8u32 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..200u32 {
                        let token = format!("w{worker}-t{}", i % 32);
                        cache.put(&token, i);
                        let _ = cache.get(&token);
                    }
                });
            }
        });

        assert!(cache.len() <= 64);
    }
}
