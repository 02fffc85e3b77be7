//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Connection pool (creation, discards, acquisition waits, exhaustion)
//! - TTL cache (lookups by outcome)
//! - Pagination and search (degraded queries)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Connection pool
// =============================================================================

/// Connections opened against the database.
pub static POOL_CONNECTIONS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "taller_pool_connections_created_total",
        "Total database connections opened",
    )
    .unwrap()
});

/// Connections discarded after failing validation.
pub static POOL_CONNECTIONS_DISCARDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "taller_pool_connections_discarded_total",
            "Connections discarded after failing validation",
        ),
        &["reason"], // "broken_idle", "broken_returned"
    )
    .unwrap()
});

/// Time spent waiting in `acquire`.
pub static POOL_ACQUIRE_WAIT: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "taller_pool_acquire_wait_seconds",
            "Time spent acquiring a pooled connection",
        )
        .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0]),
    )
    .unwrap()
});

/// Acquisitions that timed out with the pool saturated.
pub static POOL_EXHAUSTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "taller_pool_exhausted_total",
        "Acquisitions that timed out waiting for a connection",
    )
    .unwrap()
});

/// Connections currently loaned out.
pub static POOL_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "taller_pool_active_connections",
        "Connections currently loaned out",
    )
    .unwrap()
});

/// Raw queries that degraded to an empty result.
pub static POOL_DEGRADED_EXECUTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "taller_pool_degraded_executes_total",
        "Raw queries that failed and degraded to an empty result",
    )
    .unwrap()
});

// =============================================================================
// TTL cache
// =============================================================================

/// Cache lookups by outcome.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("taller_cache_lookups_total", "Cache lookups by outcome"),
        &["result"], // "hit", "miss", "stale_fallback"
    )
    .unwrap()
});

// =============================================================================
// Pagination / search
// =============================================================================

/// Read queries converted into empty pages or result lists.
pub static READS_DEGRADED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "taller_reads_degraded_total",
            "Read queries converted into empty results",
        ),
        &["component"], // "pagination", "search"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(POOL_CONNECTIONS_CREATED.clone()),
        Box::new(POOL_CONNECTIONS_DISCARDED.clone()),
        Box::new(POOL_ACQUIRE_WAIT.clone()),
        Box::new(POOL_EXHAUSTED_TOTAL.clone()),
        Box::new(POOL_ACTIVE.clone()),
        Box::new(POOL_DEGRADED_EXECUTES.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(READS_DEGRADED.clone()),
    ]
}
