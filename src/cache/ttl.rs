//! In-memory TTL cache with stale fallback
//!
//! `TtlCache` maps caller-chosen string keys to the last successfully fetched
//! value and the instant it was stored. Freshness is derived at read time from
//! the entry's age; nothing is swept in the background. An expired entry stays
//! in the map until it is overwritten or invalidated, and is served in place of
//! the error when a refresh fails.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A stored value and the instant the fetch that produced it started
struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
}

impl<T> CacheEntry<T> {
    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Result of inspecting a cache entry without fetching
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    /// The cached value
    pub data: T,
    /// How long ago the value was stored
    pub age: Duration,
    /// Whether the entry is older than the cache TTL
    pub is_expired: bool,
}

/// Which branch of a read produced the returned value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Served from a fresh entry; the fetch function was not called
    Fresh,
    /// The fetch function succeeded and its value was stored
    Refreshed,
    /// The fetch function failed and an older value was served instead
    Stale,
}

/// A value returned by [`TtlCache::get_or_fetch_tagged`]
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub freshness: Freshness,
}

/// Snapshot of cache contents for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of stored entries, fresh or stale
    pub size: usize,
    /// All stored keys, sorted
    pub keys: Vec<String>,
    /// Sum of the JSON-serialized lengths of all stored values
    pub approx_bytes: usize,
}

/// Key-value response cache with a fixed TTL and stale-on-error fallback
///
/// Reads go through [`get_or_fetch`](Self::get_or_fetch): a fresh entry is
/// returned as is, otherwise the supplied fetch function runs. A successful
/// fetch overwrites the entry. A failed fetch is swallowed if the key held any
/// value before the call, and that value is returned; with no prior value the
/// error is returned unchanged.
///
/// The map lock is only held around reads and writes, never while a fetch is
/// in flight. Concurrent reads of the same expired key each call their own
/// fetch and the last successful write wins.
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    /// Creates an empty cache whose entries stay fresh for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// The TTL applied by [`get_or_fetch`](Self::get_or_fetch)
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes the entry stored under exactly `key`
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Removes every entry whose key contains `pattern`, or every entry when
    /// `pattern` is `None`
    ///
    /// Returns the number of entries removed. Matching nothing is not an error.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        match pattern {
            Some(pattern) => entries.retain(|key, _| !key.contains(pattern)),
            None => entries.clear(),
        }
        let removed = before - entries.len();
        debug!(?pattern, removed, "invalidated cache entries");
        removed
    }
}

impl<T: Clone> TtlCache<T> {
    /// Returns the value for `key`, fetching it when absent or expired
    ///
    /// # Behavior
    /// - Fresh entry: returned without calling `fetch`
    /// - Absent or expired: `fetch` runs; on success the value is stored with
    ///   the time this call started and returned
    /// - `fetch` fails and the key held a value before this call: that value
    ///   is returned and the entry is left untouched
    /// - `fetch` fails and the key was empty: the error is returned as is
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_fetch_with_ttl(key, self.ttl, fetch).await
    }

    /// Same as [`get_or_fetch`](Self::get_or_fetch), judging freshness
    /// against `ttl` instead of the cache's own TTL
    pub async fn get_or_fetch_with_ttl<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.resolve(key, ttl, fetch).await.map(|fetched| fetched.data)
    }

    /// Same as [`get_or_fetch`](Self::get_or_fetch), also reporting whether the
    /// value is fresh, newly fetched, or stale because the refresh failed
    pub async fn get_or_fetch_tagged<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
    ) -> Result<Fetched<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.resolve(key, self.ttl, fetch).await
    }

    /// Inspects the entry for `key` without fetching or mutating anything
    pub fn lookup(&self, key: &str) -> Option<CachedData<T>> {
        let now = Instant::now();
        let entries = self.entries.lock();
        entries.get(key).map(|entry| CachedData {
            data: entry.value.clone(),
            age: entry.age(now),
            is_expired: !entry.is_fresh(now, self.ttl),
        })
    }

    async fn resolve<F, Fut, E>(&self, key: &str, ttl: Duration, fetch: F) -> Result<Fetched<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();

        let prior = {
            let entries = self.entries.lock();
            match entries.get(key) {
                Some(entry) if entry.is_fresh(started, ttl) => {
                    debug!(key, "serving fresh cache entry");
                    return Ok(Fetched {
                        data: entry.value.clone(),
                        freshness: Freshness::Fresh,
                    });
                }
                Some(entry) => Some(entry.value.clone()),
                None => None,
            }
        };

        match fetch().await {
            Ok(value) => {
                self.entries.lock().insert(
                    key.to_owned(),
                    CacheEntry {
                        value: value.clone(),
                        stored_at: started,
                    },
                );
                Ok(Fetched {
                    data: value,
                    freshness: Freshness::Refreshed,
                })
            }
            Err(err) => match prior {
                Some(data) => {
                    warn!(key, "fetch failed, serving stale cache entry");
                    Ok(Fetched {
                        data,
                        freshness: Freshness::Stale,
                    })
                }
                None => Err(err),
            },
        }
    }
}

impl<T: Serialize> TtlCache<T> {
    /// Returns the entry count, sorted keys, and an approximate payload size
    ///
    /// The size is the JSON length of each stored value; values that fail to
    /// serialize count as zero.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        let approx_bytes = entries
            .values()
            .map(|entry| serde_json::to_vec(&entry.value).map_or(0, |json| json.len()))
            .sum();

        CacheStats {
            size: entries.len(),
            keys,
            approx_bytes,
        }
    }
}
