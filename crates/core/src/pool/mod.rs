//! Bounded connection pool for the ticket database.
//!
//! Hands out validated connections on loan and reclaims them when the
//! guard is dropped. The number of live connections never exceeds
//! `max_connections`; callers that arrive while the pool is saturated
//! block on a wait queue up to the configured acquisition timeout.

mod config;
mod connection;
mod error;
mod manager;

pub use config::PoolConfig;
pub use connection::PooledConnection;
pub use error::PoolError;
pub use manager::{ConnectionPool, PoolGuard, PoolStatus};
