//! Cached reference catalogs: technician roster, spare-parts and
//! product catalogs, problem list. Slow-changing data served through
//! the TTL cache and fetched over the connection pool's degrade-to-empty
//! read primitive.

mod catalog;
mod types;

pub use catalog::ReferenceCatalog;
pub use types::{Problem, Product, SparePart, Technician};
