//! Short-lived answer memoization keyed by the normalized question.
//!
//! Key: lowercase, trimmed, internal whitespace collapsed.
//! Expiry: an entry is readable for `ttl` after its `put`; afterwards it reads
//! as absent and the next `put` overwrites it.
//! Bound: optional; on overflow expired entries are purged first, then the
//! oldest entry is evicted.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::debug;

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Canonical cache key for a question.
pub fn normalize_key(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug)]
struct CacheEntry {
    value: String,
    stored_at: Instant,
}

/// Thread-safe TTL map. The lock is held only for map operations.
pub struct AnswerCache {
    ttl: Duration,
    max_entries: Option<usize>,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl AnswerCache {
    pub fn new(ttl: Duration, max_entries: Option<usize>) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, max_entries: Option<usize>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            max_entries,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh value for `key`, if any. Expired entries are dropped on read.
    pub fn get(&self, key: &str) -> Option<String> {
        let key = normalize_key(key);
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(e) if now.saturating_duration_since(e.stored_at) < self.ttl => {
                Some(e.value.clone())
            }
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under the normalized `key`, replacing any previous entry.
    pub fn put(&self, key: &str, value: &str) {
        let key = normalize_key(key);
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        if let Some(max) = self.max_entries {
            if !entries.contains_key(&key) && entries.len() >= max {
                let ttl = self.ttl;
                entries.retain(|_, e| now.saturating_duration_since(e.stored_at) < ttl);
                if entries.len() >= max {
                    let oldest = entries
                        .iter()
                        .min_by_key(|(_, e)| e.stored_at)
                        .map(|(k, _)| k.clone());
                    if let Some(oldest) = oldest {
                        debug!(key = %oldest, "answer cache full; evicting oldest entry");
                        entries.remove(&oldest);
                    }
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value: value.to_string(),
                stored_at: now,
            },
        );
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
