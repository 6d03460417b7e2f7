//! Process-wide bearer token cache.
//!
//! Entries are keyed by `<token_url>:<secret_name>` and are reported as
//! missing once they are within [`SAFETY_MARGIN_SECS`] of expiry, so callers
//! refresh before the token actually lapses. Reads share the lock; writes
//! replace whole entries.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use actuator_core::types::Timestamp;
use tracing::debug;

/// Tokens this close to expiry are treated as already expired.
pub const SAFETY_MARGIN_SECS: i64 = 600;

#[derive(Clone)]
struct CachedCredential {
    token: String,
    expires_at: Timestamp,
}

/// Thread-safe, time-bounded token store.
#[derive(Default)]
pub struct CredentialCache {
    entries: RwLock<HashMap<String, CachedCredential>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_key(token_url: &str, secret_name: &str) -> String {
        format!("{}:{}", token_url, secret_name)
    }

    /// Valid token for `key`, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Timestamp::now())
    }

    /// Lookup evaluated at an explicit instant.
    pub fn get_at(&self, key: &str, now: Timestamp) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if now.plus_secs(SAFETY_MARGIN_SECS) > entry.expires_at {
            debug!(key = %key, "cached credential inside safety margin");
            return None;
        }
        Some(entry.token.clone())
    }

    /// Store `token` for `ttl_secs` from now, replacing any previous entry.
    pub fn put(&self, key: &str, token: &str, ttl_secs: i64) {
        self.put_at(key, token, ttl_secs, Timestamp::now());
    }

    pub fn put_at(&self, key: &str, token: &str, ttl_secs: i64, now: Timestamp) {
        let entry = CachedCredential {
            token: token.to_string(),
            expires_at: now.plus_secs(ttl_secs),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
        debug!(key = %key, ttl_secs, "credential cached");
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const T0: Timestamp = Timestamp(1_700_000_000);

    #[test]
    fn test_cache_key_format() {
        assert_eq!(
            CredentialCache::cache_key("https://idp.example.com/token", "golf/prod"),
            "https://idp.example.com/token:golf/prod"
        );
    }

    #[test]
    fn test_ttl_600_found_at_put_time() {
        let cache = CredentialCache::new();
        cache.put_at("k", "tok", 600, T0);
        assert_eq!(cache.get_at("k", T0).as_deref(), Some("tok"));
    }

    #[test]
    fn test_ttl_600_missing_at_591_seconds() {
        let cache = CredentialCache::new();
        cache.put_at("k", "tok", 600, T0);
        assert!(cache.get_at("k", T0.plus_secs(591)).is_none());
        assert!(cache.get_at("k", T0.plus_secs(1)).is_none());
    }

    #[test]
    fn test_long_ttl_respects_margin() {
        let cache = CredentialCache::new();
        cache.put_at("k", "tok", 3600, T0);
        assert!(cache.get_at("k", T0.plus_secs(3000)).is_some());
        assert!(cache.get_at("k", T0.plus_secs(3001)).is_none());
    }

    #[test]
    fn test_absent_key() {
        assert!(CredentialCache::new().get("nothing").is_none());
    }

    #[test]
    fn test_put_replaces_entry() {
        let cache = CredentialCache::new();
        cache.put_at("k", "old", 3600, T0);
        cache.put_at("k", "new", 700, T0);
        assert_eq!(cache.get_at("k", T0).as_deref(), Some("new"));
        // The replacement's shorter lifetime applies, not the old one.
        assert!(cache.get_at("k", T0.plus_secs(200)).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = CredentialCache::new();
        cache.put("a", "1", 3600);
        cache.put("b", "2", 3600);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_debug_hides_tokens() {
        let cache = CredentialCache::new();
        cache.put("a", "super-secret", 3600);
        assert!(!format!("{:?}", cache).contains("super-secret"));
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(CredentialCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..200 {
                        let key = format!("k{}", j % 4);
                        if i % 2 == 0 {
                            cache.put(&key, &format!("t{}-{}", i, j), 3600);
                        } else {
                            let _ = cache.get(&key);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
        assert!(cache.get("k0").unwrap().starts_with('t'));
    }
}
