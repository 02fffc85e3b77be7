use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use tracing::{debug, warn};

use super::{PoolConfig, PoolError, PooledConnection};
use crate::metrics;

/// Queries slower than this are logged with a warning.
const SLOW_QUERY_THRESHOLD: Duration = Duration::from_secs(5);

/// Where the pool opens its connections.
enum Target {
    File(PathBuf),
    /// Named shared-cache in-memory database, for tests.
    Memory(String),
}

struct PoolState {
    idle: Vec<PooledConnection>,
    /// Live connections: idle + loaned. Never exceeds `max_connections`.
    live: usize,
}

/// Snapshot of the pool's bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    /// Connections currently loaned out.
    pub active: usize,
    /// Connections parked in the idle set.
    pub idle: usize,
    pub max_connections: usize,
}

/// Bounded pool of SQLite connections.
///
/// Owned explicitly by the application startup context and shared via
/// `Arc`; there is no process-global instance.
pub struct ConnectionPool {
    target: Target,
    config: PoolConfig,
    state: Mutex<PoolState>,
    returned: Condvar,
    /// Keeps the shared in-memory database alive for the pool's lifetime.
    _anchor: Option<Mutex<Connection>>,
}

impl ConnectionPool {
    /// Open a file-backed pool, eagerly creating `initial_connections`
    /// handles. Individual pre-fill failures are logged and tolerated;
    /// the pool starts degraded rather than refusing to start.
    pub fn open(path: impl AsRef<Path>, config: PoolConfig) -> Self {
        let pool = Self {
            target: Target::File(path.as_ref().to_path_buf()),
            config,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                live: 0,
            }),
            returned: Condvar::new(),
            _anchor: None,
        };
        pool.prefill();
        pool
    }

    /// Open a pool over a named shared-cache in-memory database.
    ///
    /// An anchor connection is held for the pool's lifetime so the
    /// database survives moments where every pooled handle is closed.
    pub fn in_memory(config: PoolConfig) -> Result<Self, PoolError> {
        let name = format!("taller-{}", uuid::Uuid::new_v4());
        let pool = Self {
            target: Target::Memory(name),
            config,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                live: 0,
            }),
            returned: Condvar::new(),
            _anchor: None,
        };
        let anchor = pool.connect()?;
        let pool = Self {
            _anchor: Some(Mutex::new(anchor)),
            ..pool
        };
        pool.prefill();
        Ok(pool)
    }

    fn prefill(&self) {
        let count = self
            .config
            .initial_connections
            .min(self.config.max_connections);
        let mut created = Vec::with_capacity(count);
        for _ in 0..count {
            match self.connect() {
                Ok(conn) => created.push(PooledConnection::new(conn)),
                Err(e) => warn!(error = %e, "failed to pre-fill pool connection"),
            }
        }
        let mut state = self.state.lock().unwrap();
        state.live += created.len();
        state.idle.extend(created);
        debug!(connections = state.live, "pool pre-filled");
    }

    fn connect(&self) -> Result<Connection, PoolError> {
        let conn = match &self.target {
            Target::File(path) => Connection::open(path),
            Target::Memory(name) => Connection::open_with_flags(
                format!("file:{name}?mode=memory&cache=shared"),
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            ),
        }
        .map_err(|e| PoolError::Creation(e.to_string()))?;

        conn.busy_timeout(self.config.connect_timeout())
            .map_err(|e| PoolError::Creation(e.to_string()))?;
        if matches!(self.target, Target::File(_)) {
            // WAL lets concurrent readers proceed while one writer holds
            // the database.
            conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))
                .map_err(|e| PoolError::Creation(e.to_string()))?;
        }

        metrics::POOL_CONNECTIONS_CREATED.inc();
        Ok(conn)
    }

    /// Borrow a validated connection, waiting up to the configured
    /// acquisition timeout when the pool is saturated.
    pub fn acquire(&self) -> Result<PoolGuard<'_>, PoolError> {
        let started = Instant::now();
        let deadline = started + self.config.acquire_timeout();

        let mut state = self.state.lock().unwrap();
        loop {
            // Idle handle first. The liveness probe runs outside the
            // pool mutex.
            if let Some(mut pooled) = state.idle.pop() {
                drop(state);
                if pooled.is_valid() {
                    return Ok(self.loan(pooled, started));
                }
                debug!("discarding broken idle connection");
                metrics::POOL_CONNECTIONS_DISCARDED
                    .with_label_values(&["broken_idle"])
                    .inc();
                state = self.state.lock().unwrap();
                state.live -= 1;
                self.returned.notify_one();
                continue;
            }

            // Below capacity: open a fresh connection. The slot is
            // reserved before the I/O so a concurrent caller cannot
            // push the pool past its bound.
            if state.live < self.config.max_connections {
                state.live += 1;
                drop(state);
                match self.connect() {
                    Ok(conn) => return Ok(self.loan(PooledConnection::new(conn), started)),
                    Err(e) => {
                        let mut state = self.state.lock().unwrap();
                        state.live -= 1;
                        self.returned.notify_one();
                        return Err(e);
                    }
                }
            }

            // Saturated: wait for a release.
            let now = Instant::now();
            if now >= deadline {
                metrics::POOL_EXHAUSTED_TOTAL.inc();
                return Err(PoolError::Exhausted {
                    waited_secs: self.config.acquire_timeout_secs,
                    max_connections: self.config.max_connections,
                });
            }
            let (reacquired, _timeout) = self
                .returned
                .wait_timeout(state, deadline - now)
                .unwrap();
            state = reacquired;
        }
    }

    fn loan<'a>(&'a self, pooled: PooledConnection, started: Instant) -> PoolGuard<'a> {
        metrics::POOL_ACQUIRE_WAIT.observe(started.elapsed().as_secs_f64());
        metrics::POOL_ACTIVE.inc();
        PoolGuard {
            pool: self,
            conn: Some(pooled),
        }
    }

    /// Return a loaned connection. Invoked by [`PoolGuard::drop`].
    ///
    /// The handle is re-validated before rejoining the idle set so a
    /// connection broken while on loan does not poison the pool.
    fn release(&self, mut pooled: PooledConnection) {
        let healthy = pooled.is_valid();
        let mut state = self.state.lock().unwrap();
        if healthy {
            state.idle.push(pooled);
        } else {
            warn!("returned connection failed validation, discarding");
            metrics::POOL_CONNECTIONS_DISCARDED
                .with_label_values(&["broken_returned"])
                .inc();
            state.live -= 1;
        }
        drop(state);
        metrics::POOL_ACTIVE.dec();
        self.returned.notify_one();
    }

    /// Run a parameterized read query and collect the raw rows.
    ///
    /// Failures are logged and converted into an empty result set: this
    /// primitive backs non-critical read paths where a degraded answer
    /// beats a crash. Schema changes and writes must not go through
    /// here; use an acquired guard and handle the error.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Vec<Vec<Value>> {
        let started = Instant::now();
        let guard = match self.acquire() {
            Ok(guard) => guard,
            Err(e) => {
                warn!(error = %e, "query degraded to empty result: no connection");
                metrics::POOL_DEGRADED_EXECUTES.inc();
                return Vec::new();
            }
        };

        let deadline = Instant::now() + self.config.command_timeout();
        guard.progress_handler(1000, Some(move || Instant::now() >= deadline));
        let result = run_query(&guard, sql, params);
        guard.progress_handler(0, None::<fn() -> bool>);

        let elapsed = started.elapsed();
        if elapsed > SLOW_QUERY_THRESHOLD {
            warn!(elapsed_secs = elapsed.as_secs_f64(), sql = truncate(sql, 100), "slow query");
        }

        match result {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, sql = truncate(sql, 200), "query degraded to empty result");
                metrics::POOL_DEGRADED_EXECUTES.inc();
                Vec::new()
            }
        }
    }

    /// Current pool bookkeeping.
    pub fn status(&self) -> PoolStatus {
        let state = self.state.lock().unwrap();
        PoolStatus {
            active: state.live - state.idle.len(),
            idle: state.idle.len(),
            max_connections: self.config.max_connections,
        }
    }
}

fn run_query(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<Vec<Value>>> {
    let mut stmt = conn.prepare(sql)?;
    let columns = stmt.column_count();
    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(columns);
        for i in 0..columns {
            record.push(row.get::<_, Value>(i)?);
        }
        out.push(record);
    }
    Ok(out)
}

fn truncate(sql: &str, max: usize) -> &str {
    match sql.char_indices().nth(max) {
        Some((idx, _)) => &sql[..idx],
        None => sql,
    }
}

/// RAII loan of a pooled connection. Derefs to [`rusqlite::Connection`];
/// dropping returns the handle to the pool.
pub struct PoolGuard<'a> {
    pool: &'a ConnectionPool,
    conn: Option<PooledConnection>,
}

impl Deref for PoolGuard<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn.as_ref().expect("connection present until drop").conn
    }
}

impl DerefMut for PoolGuard<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn.as_mut().expect("connection present until drop").conn
    }
}

impl Drop for PoolGuard<'_> {
    fn drop(&mut self) {
        if let Some(pooled) = self.conn.take() {
            self.pool.release(pooled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(max: usize) -> ConnectionPool {
        ConnectionPool::in_memory(PoolConfig {
            max_connections: max,
            initial_connections: 1,
            acquire_timeout_secs: 1,
            ..PoolConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_prefill_respects_max() {
        let pool = ConnectionPool::in_memory(PoolConfig {
            max_connections: 2,
            initial_connections: 5,
            ..PoolConfig::default()
        })
        .unwrap();

        let status = pool.status();
        assert_eq!(status.idle, 2);
        assert_eq!(status.active, 0);
    }

    #[test]
    fn test_acquire_reuses_idle_connection() {
        let pool = small_pool(3);
        {
            let _guard = pool.acquire().unwrap();
            assert_eq!(pool.status().active, 1);
        }
        // Returned to the idle set, not closed.
        let status = pool.status();
        assert_eq!(status.active, 0);
        assert_eq!(status.idle, 1);
    }

    #[test]
    fn test_acquire_times_out_when_exhausted() {
        let pool = small_pool(1);
        let _held = pool.acquire().unwrap();

        let started = Instant::now();
        let result = pool.acquire();
        assert!(matches!(result, Err(PoolError::Exhausted { .. })));
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[test]
    fn test_release_unblocks_waiter() {
        use std::sync::Arc;

        let pool = Arc::new(small_pool(1));
        let guard = pool.acquire().unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || pool.acquire().map(|_| ()))
        };
        std::thread::sleep(Duration::from_millis(100));
        drop(guard);

        waiter.join().unwrap().unwrap();
    }

    #[test]
    fn test_in_memory_pool_shares_one_database() {
        let pool = small_pool(3);
        {
            let guard = pool.acquire().unwrap();
            guard
                .execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7)")
                .unwrap();
        }
        // A different pooled handle sees the same data.
        let rows = pool.execute("SELECT x FROM t", &[]);
        assert_eq!(rows, vec![vec![Value::Integer(7)]]);
    }

    #[test]
    fn test_execute_degrades_to_empty_on_bad_sql() {
        let pool = small_pool(2);
        let rows = pool.execute("SELECT * FROM no_such_table", &[]);
        assert!(rows.is_empty());
        // The borrowed connection went back to the pool.
        assert_eq!(pool.status().active, 0);
    }

    #[test]
    fn test_execute_binds_parameters() {
        let pool = small_pool(2);
        {
            let guard = pool.acquire().unwrap();
            guard
                .execute_batch(
                    "CREATE TABLE t (x INTEGER, y TEXT);
                     INSERT INTO t VALUES (1, 'one'), (2, 'two')",
                )
                .unwrap();
        }
        let rows = pool.execute(
            "SELECT y FROM t WHERE x = ?",
            &[Value::Integer(2)],
        );
        assert_eq!(rows, vec![vec![Value::Text("two".to_string())]]);
    }

    #[test]
    fn test_bound_holds_under_concurrent_storm() {
        use std::sync::Arc;

        let pool = Arc::new(ConnectionPool::in_memory(PoolConfig {
            max_connections: 4,
            initial_connections: 0,
            acquire_timeout_secs: 5,
            ..PoolConfig::default()
        })
        .unwrap());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        let guard = pool.acquire().unwrap();
                        let status = pool.status();
                        assert!(status.active + status.idle <= status.max_connections);
                        assert!(status.active >= 1);
                        drop(guard);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        let status = pool.status();
        assert_eq!(status.active, 0);
        assert!(status.idle <= 4);
    }
}
