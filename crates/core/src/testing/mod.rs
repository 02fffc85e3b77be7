//! Testing utilities: an in-memory ticket store with error injection
//! and fixture builders, used by the engine tests and integration
//! suites.

mod fixtures;
mod mock_store;

pub use fixtures::{new_ticket, ticket};
pub use mock_store::MockTicketStore;
