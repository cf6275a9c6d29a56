//! Version-resolution cache
//!
//! A process-wide TTL cache for registry responses, shared across resolution
//! sessions to avoid re-querying packages seen in earlier runs. The cache is
//! an explicitly owned object: the embedding application constructs one and
//! passes it by `Arc` handle into resolution calls, and the administrative
//! operations (`clear`, `stats`, `cleanup`) are methods on that instance.
//!
//! Entries are append/expire-only with no transactional semantics. An entry
//! whose age has reached the TTL is treated as absent on read; `cleanup`
//! physically removes such entries and never touches fresh ones. Individual
//! reads and writes are atomic under the interior lock, which is enough for
//! the batched, cooperatively scheduled resolution flow; overlapping sessions
//! may still fetch the same key twice, in which case the last write wins.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Cache identity: one package plus the query made about it
/// (e.g. `versions`, `pinned:4.17.21`, `latest`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub package: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(package: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            query: query.into(),
        }
    }
}

struct CacheEntry {
    data: Vec<u8>,
    inserted_at: Instant,
}

/// Snapshot of cache health for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    /// Hits as parts-per-thousand of all lookups since construction or the
    /// last `clear`; avoids floats so the value is exact and comparable
    pub hit_ratio_permille: u64,
    pub age_distribution: AgeDistribution,
}

/// How old the resident entries are
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeDistribution {
    pub under_one_minute: usize,
    pub under_ten_minutes: usize,
    pub older: usize,
}

/// Result of one cleanup pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub expired_count: usize,
    pub remaining_count: usize,
}

/// TTL-bounded cache of serialized registry responses
pub struct ResolutionCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResolutionCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a key. Expired entries and undeserializable payloads count as
    /// misses; physical removal is left to `cleanup`.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => entry,
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match serde_json::from_slice(&entry.data) {
            Ok(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(package = %key.package, query = %key.query, "cache hit");
                Some(value)
            }
            Err(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value, replacing any previous entry for the key.
    /// Unserializable values are dropped silently; the cache is best-effort.
    pub fn set<T: Serialize>(&self, key: CacheKey, value: &T) {
        let Ok(data) = serde_json::to_vec(value) else {
            return;
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CacheEntry {
                data,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every entry and reset the hit counters.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Remove entries whose age has reached the TTL. Fresh entries are never
    /// removed.
    pub fn cleanup(&self) -> CleanupReport {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        let remaining = entries.len();

        let report = CleanupReport {
            expired_count: before - remaining,
            remaining_count: remaining,
        };
        debug!(
            expired = report.expired_count,
            remaining = report.remaining_count,
            "cache cleanup"
        );
        report
    }

    /// Entry count, hit ratio, and age distribution of resident entries.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());

        let mut ages = AgeDistribution::default();
        for entry in entries.values() {
            let age = entry.inserted_at.elapsed();
            if age < Duration::from_secs(60) {
                ages.under_one_minute += 1;
            } else if age < Duration::from_secs(600) {
                ages.under_ten_minutes += 1;
            } else {
                ages.older += 1;
            }
        }

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_ratio_permille = if total == 0 { 0 } else { hits * 1000 / total };

        CacheStats {
            entry_count: entries.len(),
            hit_ratio_permille,
            age_distribution: ages,
        }
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}
