//! Repair ticket entity, storage trait and SQLite-backed store.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub use store::{StoreError, TicketStore};
pub use types::{NewTicket, ServiceKind, Ticket, TicketState};
