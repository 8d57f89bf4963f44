use crate::server::DEFAULT_TIMESTAMP_SKEW;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use std::time::{Duration, SystemTime};

/// A record of nonces already seen, used by the server to reject replayed requests.
///
/// `check_and_record` must atomically check whether `(id, nonce)` has been seen and record
/// it if not, returning true only for a fresh nonce.  Any function or closure with the same
/// signature is a `NonceStore`.
pub trait NonceStore: Send + Sync {
    fn check_and_record(&self, id: &str, nonce: &str, ts: SystemTime) -> bool;
}

impl<F> NonceStore for F
where
    F: Fn(&str, &str, SystemTime) -> bool + Send + Sync,
{
    fn check_and_record(&self, id: &str, nonce: &str, ts: SystemTime) -> bool {
        self(id, nonce, ts)
    }
}

/// Maximum number of nonces a `MemoryNonceStore` keeps by default.
pub const MAX_NONCE_COUNT: usize = 10_000;

/// An in-process `NonceStore`.
///
/// The store is bounded.  Once it holds `max_nonces` entries, recording a new nonce first
/// drops every nonce older than the new one's timestamp minus the retention window (twice
/// the default timestamp skew).  A server rejects such requests as stale before the nonce
/// is consulted.  If the store is still full after that, the oldest tenth is evicted.
/// `purge_older_than` can also be called directly.
#[derive(Debug)]
pub struct MemoryNonceStore {
    seen: DashMap<(String, String), SystemTime>,
    retention: Duration,
    max_nonces: usize,
}

impl Default for MemoryNonceStore {
    fn default() -> Self {
        MemoryNonceStore::new()
    }
}

impl MemoryNonceStore {
    pub fn new() -> Self {
        MemoryNonceStore {
            seen: DashMap::new(),
            retention: DEFAULT_TIMESTAMP_SKEW * 2,
            max_nonces: MAX_NONCE_COUNT,
        }
    }

    /// Keep nonces for `retention` behind the newest timestamp recorded.  A server with a
    /// custom `timestamp_skew` should use at least twice that skew.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_max_nonces(mut self, max: usize) -> Self {
        self.max_nonces = max.max(1);
        self
    }

    /// Forget every nonce whose timestamp is earlier than `cutoff`.
    pub fn purge_older_than(&self, cutoff: SystemTime) {
        let before = self.seen.len();
        self.seen.retain(|_, ts| *ts >= cutoff);
        debug!("purged {} nonces", before.saturating_sub(self.seen.len()));
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn make_room(&self, ts: SystemTime) {
        if self.seen.len() < self.max_nonces {
            return;
        }
        if let Some(cutoff) = ts.checked_sub(self.retention) {
            self.purge_older_than(cutoff);
        }
        if self.seen.len() >= self.max_nonces {
            self.remove_oldest((self.max_nonces / 10).max(1));
        }
    }

    fn remove_oldest(&self, count: usize) {
        let mut entries: Vec<_> = self
            .seen
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by_key(|(_, ts)| *ts);
        for (key, _) in entries.iter().take(count) {
            self.seen.remove(key);
        }
        debug!("nonce store full; evicted {} oldest nonces", count);
    }
}

impl NonceStore for MemoryNonceStore {
    fn check_and_record(&self, id: &str, nonce: &str, ts: SystemTime) -> bool {
        let key = (id.to_string(), nonce.to_string());
        if self.seen.contains_key(&key) {
            return false;
        }
        self.make_room(ts);
        match self.seen.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                e.insert(ts);
                true
            }
        }
    }
}

/// True if `ts` is within `skew` of `now`, in either direction.
pub(crate) fn within_skew(ts: SystemTime, now: SystemTime, skew: Duration) -> bool {
    match ts.duration_since(now) {
        Ok(ahead) => ahead <= skew,
        Err(e) => e.duration() <= skew,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_fresh_then_replayed() {
        let store = MemoryNonceStore::new();
        let ts = UNIX_EPOCH + Duration::from_secs(1000);
        assert!(store.check_and_record("dh37fgj492je", "abc", ts));
        assert!(!store.check_and_record("dh37fgj492je", "abc", ts));
        assert!(store.check_and_record("dh37fgj492je", "abd", ts));
        assert!(store.check_and_record("other", "abc", ts));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_purge() {
        let store = MemoryNonceStore::new();
        let old = UNIX_EPOCH + Duration::from_secs(1000);
        let new = UNIX_EPOCH + Duration::from_secs(2000);
        store.check_and_record("id", "old", old);
        store.check_and_record("id", "new", new);
        store.purge_older_than(UNIX_EPOCH + Duration::from_secs(1500));
        assert_eq!(store.len(), 1);
        assert!(store.check_and_record("id", "old", old));
        assert!(!store.check_and_record("id", "new", new));
    }

    #[test]
    fn test_bounded() {
        let store = MemoryNonceStore::new().with_max_nonces(100);
        let start = UNIX_EPOCH + Duration::from_secs(1_000_000);
        for i in 0..10_000u64 {
            let ts = start + Duration::from_secs(i);
            assert!(store.check_and_record("id", &format!("n{}", i), ts));
            assert!(store.len() <= 100);
        }
        // recent nonces are still remembered
        let last = start + Duration::from_secs(9_999);
        assert!(!store.check_and_record("id", "n9999", last));
        assert!(!store.check_and_record("id", "n9990", last));
    }

    #[test]
    fn test_full_store_keeps_retention_window() {
        let store = MemoryNonceStore::new()
            .with_max_nonces(10)
            .with_retention(Duration::from_secs(120));
        let ts = UNIX_EPOCH + Duration::from_secs(1_000_000);
        store.check_and_record("id", "old", ts - Duration::from_secs(500));
        for i in 0..9 {
            assert!(store.check_and_record("id", &format!("n{}", i), ts));
        }
        assert_eq!(store.len(), 10);

        // the stale nonce makes room; nothing inside the window is lost
        assert!(store.check_and_record("id", "fresh", ts));
        assert_eq!(store.len(), 10);
        for i in 0..9 {
            assert!(!store.check_and_record("id", &format!("n{}", i), ts));
        }
        assert!(!store.check_and_record("id", "fresh", ts));
    }

    #[test]
    fn test_concurrent_single_winner() {
        let store = Arc::new(MemoryNonceStore::new());
        let ts = UNIX_EPOCH + Duration::from_secs(1000);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.check_and_record("id", "same", ts))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|fresh| *fresh)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_closure_store() {
        let store = |_id: &str, nonce: &str, _ts: SystemTime| nonce != "used";
        assert!(store.check_and_record("id", "fresh", UNIX_EPOCH));
        assert!(!store.check_and_record("id", "used", UNIX_EPOCH));
    }

    #[test]
    fn test_within_skew() {
        let now = UNIX_EPOCH + Duration::from_secs(1000);
        let skew = Duration::from_secs(60);
        assert!(within_skew(now, now, skew));
        assert!(within_skew(now + skew, now, skew));
        assert!(within_skew(now - skew, now, skew));
        assert!(!within_skew(now + skew + Duration::from_secs(1), now, skew));
        assert!(!within_skew(now - skew - Duration::from_secs(1), now, skew));
    }
}
