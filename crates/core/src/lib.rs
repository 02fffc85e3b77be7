pub mod cache;
pub mod config;
pub mod filter;
pub mod metrics;
pub mod pagination;
pub mod pool;
pub mod reference;
pub mod search;
pub mod testing;
pub mod ticket;

pub use cache::{CacheConfig, CacheStats, TtlCache};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use filter::{CityMatch, FilterClause, FilterCompiler, FilterSpec};
pub use pagination::{PageConfig, PageRequest, PageResult, PaginationEngine, TicketScope};
pub use pool::{ConnectionPool, PoolConfig, PoolError, PoolGuard, PoolStatus};
pub use reference::{Problem, Product, ReferenceCatalog, SparePart, Technician};
pub use search::{validate_term, SearchEngine, SearchSummary, TermValidation};
pub use ticket::{
    NewTicket, ServiceKind, SqliteTicketStore, StoreError, Ticket, TicketState, TicketStore,
};
