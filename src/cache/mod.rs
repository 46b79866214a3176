//! Response cache for the game service client
//!
//! This module provides an in-memory key-value cache with a fixed TTL. Reads
//! fetch through a caller-supplied function and fall back to expired entries
//! when that function fails, so callers keep getting data while the upstream
//! is unavailable.

mod ttl;

pub use ttl::{CacheStats, CachedData, Fetched, Freshness, TtlCache};
