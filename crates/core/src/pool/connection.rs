use std::time::Instant;

use rusqlite::Connection;

/// A live database connection owned by the pool.
///
/// Only ever held in the pool's idle set or inside a [`PoolGuard`]
/// loaned to exactly one caller.
///
/// [`PoolGuard`]: super::PoolGuard
pub struct PooledConnection {
    pub(super) conn: Connection,
    pub(super) created_at: Instant,
    pub(super) last_validated: Instant,
}

impl PooledConnection {
    pub(super) fn new(conn: Connection) -> Self {
        let now = Instant::now();
        Self {
            conn,
            created_at: now,
            last_validated: now,
        }
    }

    /// Cheap liveness probe. A connection that cannot answer `SELECT 1`
    /// is considered broken and gets discarded by the pool.
    pub(super) fn is_valid(&mut self) -> bool {
        let ok = self
            .conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok();
        if ok {
            self.last_validated = Instant::now();
        }
        ok
    }

    /// When this connection was opened.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When this connection last passed a liveness probe.
    pub fn last_validated(&self) -> Instant {
        self.last_validated
    }
}
