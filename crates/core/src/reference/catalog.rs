use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::types::Value;

use super::{Problem, Product, SparePart, Technician};
use crate::cache::TtlCache;
use crate::pool::ConnectionPool;
use crate::ticket::StoreError;

const TECHNICIANS_TTL: Duration = Duration::from_secs(600);
const SPARE_PARTS_TTL: Duration = Duration::from_secs(1800);
const PRODUCTS_TTL: Duration = Duration::from_secs(1800);
const PROBLEMS_TTL: Duration = Duration::from_secs(3600);

/// Cached access to the slow-changing reference tables.
///
/// Reads go through [`ConnectionPool::execute`], so a degraded database
/// yields an empty (and cached) catalog rather than an error; explicit
/// invalidation is the only write path after population.
pub struct ReferenceCatalog {
    pool: Arc<ConnectionPool>,
    cache: Arc<TtlCache>,
}

impl ReferenceCatalog {
    /// Create the catalog, initializing its reference tables if needed.
    pub fn new(pool: Arc<ConnectionPool>, cache: Arc<TtlCache>) -> Result<Self, StoreError> {
        let guard = pool.acquire()?;
        guard
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS technicians (
                    name TEXT NOT NULL,
                    document TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS spare_parts (
                    code TEXT NOT NULL,
                    description TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS products (
                    code TEXT NOT NULL,
                    description TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS problems (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL
                );
                "#,
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        drop(guard);
        Ok(Self { pool, cache })
    }

    pub fn technicians(&self) -> Arc<Vec<Technician>> {
        let result = self.cache.get_or_fetch("technicians", Some(TECHNICIANS_TTL), || {
            let rows = self.pool.execute(
                "SELECT name, document FROM technicians ORDER BY name",
                &[],
            );
            Ok::<_, Infallible>(
                rows.iter()
                    .map(|row| Technician {
                        name: text(row, 0),
                        document: text(row, 1),
                    })
                    .collect::<Vec<_>>(),
            )
        });
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn spare_parts(&self) -> Arc<Vec<SparePart>> {
        let result = self.cache.get_or_fetch("spare_parts", Some(SPARE_PARTS_TTL), || {
            let rows = self.pool.execute(
                "SELECT code, description FROM spare_parts ORDER BY code",
                &[],
            );
            Ok::<_, Infallible>(
                rows.iter()
                    .map(|row| SparePart {
                        code: text(row, 0),
                        description: text(row, 1),
                    })
                    .collect::<Vec<_>>(),
            )
        });
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn products(&self) -> Arc<Vec<Product>> {
        let result = self.cache.get_or_fetch("products", Some(PRODUCTS_TTL), || {
            let rows = self.pool.execute(
                "SELECT code, description FROM products ORDER BY code",
                &[],
            );
            Ok::<_, Infallible>(
                rows.iter()
                    .map(|row| Product {
                        code: text(row, 0),
                        description: text(row, 1),
                    })
                    .collect::<Vec<_>>(),
            )
        });
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn problems(&self) -> Arc<Vec<Problem>> {
        let result = self.cache.get_or_fetch("problems", Some(PROBLEMS_TTL), || {
            let rows = self
                .pool
                .execute("SELECT id, name FROM problems ORDER BY name", &[]);
            Ok::<_, Infallible>(
                rows.iter()
                    .map(|row| Problem {
                        id: integer(row, 0),
                        name: text(row, 1),
                    })
                    .collect::<Vec<_>>(),
            )
        });
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Drop every cached catalog so the next read hits the database.
    pub fn invalidate_all(&self) {
        for key in ["technicians", "spare_parts", "products", "problems"] {
            self.cache.invalidate(key);
        }
    }

    /// Clear and preload the hot catalogs.
    pub fn warm(&self) {
        self.invalidate_all();
        self.technicians();
        self.spare_parts();
        self.products();
    }
}

fn text(row: &[Value], index: usize) -> String {
    match row.get(index) {
        Some(Value::Text(s)) => s.clone(),
        Some(Value::Integer(i)) => i.to_string(),
        Some(Value::Real(r)) => r.to_string(),
        _ => String::new(),
    }
}

fn integer(row: &[Value], index: usize) -> i64 {
    match row.get(index) {
        Some(Value::Integer(i)) => *i,
        _ => 0,
    }
}
