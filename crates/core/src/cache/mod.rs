//! TTL cache for slow-changing reference data.
//!
//! Staleness is judged lazily on read; nothing sweeps expired entries.
//! Fetches that fail fall back to a stale previous value when one exists,
//! trading freshness for availability.

mod config;
mod ttl;

pub use config::CacheConfig;
pub use ttl::{CacheStats, TtlCache};
