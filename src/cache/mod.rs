//! Fingerprint-keyed result cache with TTL expiry and FIFO eviction.
//!
//! Keys derive from the uploaded file set: each file's `name:size:mtime`
//! triple is hashed, the digests are sorted and hashed again, and the
//! requested analysis kind is prefixed. The same file set in any order
//! therefore produces the same key.
//!
//! Expiry is lazy (checked on `get`); eviction is FIFO by insertion time
//! (smallest `created_at`), not LRU. Hit/miss counters are real and feed
//! the reported hit rate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::analysis::error::{AnalysisError, Result};
use crate::analysis::models::UploadedRecord;

/// Default maximum number of cached entries.
pub const DEFAULT_CAPACITY: usize = 50;

/// Default entry time-to-live.
pub const DEFAULT_TTL_SECONDS: i64 = 30 * 60;

/// A cached value with its expiry bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    pub data: T,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Read-only cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    /// Age in seconds of the oldest entry, if any.
    pub oldest_entry_age_seconds: Option<i64>,
    pub hits: u64,
    pub misses: u64,
    /// Fraction of lookups served from cache, 0 when no lookups happened.
    pub hit_rate: f64,
}

#[derive(Debug)]
struct CacheInner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    hits: u64,
    misses: u64,
}

enum Lookup<T> {
    Hit(T),
    Expired,
    Miss,
}

/// In-process memoization of analysis results.
///
/// All access serializes through one lock; entries are never mutated in
/// place. A poisoned lock surfaces as [`AnalysisError::CacheUnavailable`]
/// so callers can degrade to always-miss instead of failing the run.
#[derive(Debug)]
pub struct CacheManager<T> {
    inner: Mutex<CacheInner<T>>,
    capacity: usize,
    default_ttl: Duration,
}

impl<T: Clone> CacheManager<T> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
            capacity,
            default_ttl,
        }
    }

    /// Look up an entry, purging it if its TTL has elapsed.
    pub fn get(&self, key: &str) -> Result<Option<T>> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        let now = Utc::now();

        let lookup = match inner.entries.get(key) {
            Some(entry) if now > entry.expires_at => Lookup::Expired,
            Some(entry) => Lookup::Hit(entry.data.clone()),
            None => Lookup::Miss,
        };

        match lookup {
            Lookup::Hit(data) => {
                inner.hits += 1;
                debug!(key, "cache hit");
                Ok(Some(data))
            }
            Lookup::Expired => {
                debug!(key, "cache entry expired");
                inner.entries.remove(key);
                inner.misses += 1;
                Ok(None)
            }
            Lookup::Miss => {
                inner.misses += 1;
                debug!(key, "cache miss");
                Ok(None)
            }
        }
    }

    /// Store an entry under the default TTL.
    pub fn set(&self, key: String, data: T) -> Result<()> {
        self.set_with_ttl(key, data, self.default_ttl)
    }

    /// Store an entry, evicting the oldest-inserted entry when at capacity.
    pub fn set_with_ttl(&self, key: String, data: T, ttl: Duration) -> Result<()> {
        let mut inner = self.lock()?;
        let now = Utc::now();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner
                .entries
                .values()
                .min_by_key(|entry| entry.created_at)
                .map(|entry| entry.key.clone())
            {
                warn!(evicted = %oldest, "cache at capacity, evicting oldest entry");
                inner.entries.remove(&oldest);
            }
        }

        inner.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                data,
                created_at: now,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let mut inner = self.lock()?;
        inner.entries.clear();
        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let inner = self.lock()?;
        let now = Utc::now();
        let oldest_entry_age_seconds = inner
            .entries
            .values()
            .map(|entry| entry.created_at)
            .min()
            .map(|created| (now - created).num_seconds());

        let lookups = inner.hits + inner.misses;
        let hit_rate = if lookups > 0 {
            inner.hits as f64 / lookups as f64
        } else {
            0.0
        };

        Ok(CacheStats {
            size: inner.entries.len(),
            oldest_entry_age_seconds,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, CacheInner<T>>> {
        self.inner
            .lock()
            .map_err(|e| AnalysisError::CacheUnavailable(e.to_string()))
    }
}

/// Derive the order-independent fingerprint key for a file set.
///
/// Per-file digests over `name:size:mtime_millis` are sorted
/// lexicographically before the final hash, so input order never changes
/// the key.
pub fn fingerprint(kind: &str, files: &[UploadedRecord]) -> String {
    let mut file_hashes: Vec<String> = files
        .iter()
        .map(|f| {
            let mut hasher = Sha256::new();
            hasher.update(f.name.as_bytes());
            hasher.update(b":");
            hasher.update(f.size.to_le_bytes());
            hasher.update(b":");
            hasher.update(f.last_modified.timestamp_millis().to_le_bytes());
            hex::encode(hasher.finalize())
        })
        .collect();
    file_hashes.sort_unstable();

    let mut hasher = Sha256::new();
    for hash in &file_hashes {
        hasher.update(hash.as_bytes());
    }
    format!("{}:{}", kind, hex::encode(hasher.finalize()))
}
