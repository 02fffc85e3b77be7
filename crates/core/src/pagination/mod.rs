//! Bounded, clamped pagination over the ticket store.

mod config;
mod engine;

pub use config::PageConfig;
pub use engine::{PageRequest, PageResult, PaginationEngine, TicketScope};
