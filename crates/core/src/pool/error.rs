use thiserror::Error;

/// Errors surfaced by the connection pool.
///
/// Validation failures on idle or returned handles are handled internally
/// by discard-and-recreate and never appear here.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The database refused a new connection while the pool was below
    /// capacity.
    #[error("failed to open database connection: {0}")]
    Creation(String),

    /// Every slot stayed loaned out for the whole acquisition timeout.
    /// Retryable.
    #[error("connection pool exhausted after waiting {waited_secs}s ({max_connections} connections loaned out)")]
    Exhausted {
        waited_secs: u64,
        max_connections: usize,
    },
}
