// ABOUTME: In-memory session cache for the last observed reader token
// ABOUTME: Reads past the TTL evict the entry and report it as absent

use std::sync::Mutex;

use tracing::debug;

use labgate_core::{now_ms, SESSION_CACHE_TTL_MS};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedToken {
    token: String,
    saved_at: i64,
}

/// Session-scoped reader token cache.
///
/// Writes are last-write-wins; a read past the TTL behaves exactly like
/// an empty cache and drops the stale entry.
pub struct SessionCache {
    entry: Mutex<Option<CachedToken>>,
    ttl_ms: i64,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCache {
    pub fn new() -> Self {
        Self {
            entry: Mutex::new(None),
            ttl_ms: SESSION_CACHE_TTL_MS as i64,
        }
    }

    /// Store a token stamped now, replacing any previous entry.
    pub fn put(&self, token: impl Into<String>) {
        self.insert(token.into(), now_ms());
    }

    /// The cached token, if still within the TTL. Expired entries are
    /// evicted on read.
    pub fn get(&self) -> Option<String> {
        let mut entry = self.entry.lock().expect("session cache poisoned");
        match entry.as_ref() {
            Some(cached) if now_ms() - cached.saved_at <= self.ttl_ms => {
                Some(cached.token.clone())
            }
            Some(_) => {
                debug!("Evicting session token past TTL");
                *entry = None;
                None
            }
            None => None,
        }
    }

    /// Drop any cached token.
    pub fn clear(&self) {
        *self.entry.lock().expect("session cache poisoned") = None;
    }

    fn insert(&self, token: String, saved_at: i64) {
        *self.entry.lock().expect("session cache poisoned") = Some(CachedToken { token, saved_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_returned() {
        let cache = SessionCache::new();
        cache.put("tok-1");
        assert_eq!(cache.get(), Some("tok-1".to_string()));
        // Still present on a second read.
        assert_eq!(cache.get(), Some("tok-1".to_string()));
    }

    #[test]
    fn expired_token_reads_as_absent_and_is_evicted() {
        let cache = SessionCache::new();
        // Saved 60s ago against a 55s TTL.
        cache.insert("tok-stale".to_string(), now_ms() - 60_000);

        assert_eq!(cache.get(), None);
        // The entry is gone, not merely hidden.
        assert!(cache.entry.lock().unwrap().is_none());
    }

    #[test]
    fn entry_just_inside_ttl_is_still_fresh() {
        let cache = SessionCache::new();
        cache.insert(
            "tok-edge".to_string(),
            now_ms() - (SESSION_CACHE_TTL_MS as i64 - 1_000),
        );
        assert_eq!(cache.get(), Some("tok-edge".to_string()));
    }

    #[test]
    fn put_replaces_previous_entry() {
        let cache = SessionCache::new();
        cache.put("first");
        cache.put("second");
        assert_eq!(cache.get(), Some("second".to_string()));
    }

    #[test]
    fn clear_drops_entry() {
        let cache = SessionCache::new();
        cache.put("tok");
        cache.clear();
        assert_eq!(cache.get(), None);
    }
}
