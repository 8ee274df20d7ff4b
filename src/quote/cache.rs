// Short-lived memo of resolved quotes, keyed by symbol.
//
// A miss just means the caller fetches again; concurrent misses for the same
// symbol may both fetch and the last insert wins.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

use super::resolver::Resolution;

struct CacheEntry {
    resolution: Resolution,
    fetched_at: Instant,
}

pub struct QuoteCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    // ttl of zero turns memoization off
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn get(&self, symbol: &str, now: Instant) -> Option<Resolution> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self.entries.lock();
        let entry = entries.get(symbol)?;
        let age = now.saturating_duration_since(entry.fetched_at);
        if age < self.ttl {
            trace!(symbol, age_ms = age.as_millis() as u64, "quote cache hit");
            metrics::counter!("stockwatch_quote_cache_total", "result" => "hit").increment(1);
            Some(entry.resolution.clone())
        } else {
            metrics::counter!("stockwatch_quote_cache_total", "result" => "expired").increment(1);
            None
        }
    }

    pub fn insert(&self, symbol: &str, resolution: Resolution, now: Instant) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock();
        entries.insert(symbol.to_string(), CacheEntry { resolution, fetched_at: now });
    }

    // Drop expired entries; called opportunistically by the resolver.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, e| now.saturating_duration_since(e.fetched_at) < ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::resolver::UnavailableReason;

    fn unavailable(symbol: &str) -> Resolution {
        Resolution::Unavailable {
            symbol: symbol.to_string(),
            display_name: symbol.to_string(),
            reason: UnavailableReason::Incomplete,
        }
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = QuoteCache::new(Duration::from_secs(20));
        let t0 = Instant::now();
        cache.insert("2330.TW", unavailable("2330.TW"), t0);
        assert!(cache.get("2330.TW", t0 + Duration::from_secs(19)).is_some());
        assert!(cache.get("0050.TW", t0).is_none());
    }

    #[test]
    fn test_miss_after_ttl() {
        let cache = QuoteCache::new(Duration::from_secs(20));
        let t0 = Instant::now();
        cache.insert("2330.TW", unavailable("2330.TW"), t0);
        assert!(cache.get("2330.TW", t0 + Duration::from_secs(20)).is_none());
    }

    #[test]
    fn test_disabled_never_stores() {
        let cache = QuoteCache::disabled();
        let t0 = Instant::now();
        cache.insert("2330.TW", unavailable("2330.TW"), t0);
        assert!(cache.is_empty());
        assert!(cache.get("2330.TW", t0).is_none());
    }

    #[test]
    fn test_evict_expired() {
        let cache = QuoteCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.insert("2330.TW", unavailable("2330.TW"), t0);
        cache.insert("0050.TW", unavailable("0050.TW"), t0 + Duration::from_secs(8));
        assert_eq!(cache.evict_expired(t0 + Duration::from_secs(12)), 1);
        assert_eq!(cache.len(), 1);
    }
}
