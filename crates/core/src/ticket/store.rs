//! Ticket storage trait: the collaborator contract the pagination and
//! search engines run against.

use thiserror::Error;

use crate::filter::FilterClause;
use crate::pool::PoolError;
use crate::ticket::{NewTicket, Ticket, TicketState};

/// Errors surfaced by ticket stores.
///
/// The engines never propagate these to their callers; they log and
/// degrade to empty results. CRUD callers get them as-is.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ticket not found: {0}")]
    NotFound(i64),

    #[error("cannot move ticket {ticket_id} from {current_state} to {requested}")]
    InvalidState {
        ticket_id: i64,
        current_state: String,
        requested: String,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("database error: {0}")]
    Database(String),
}

/// Queryable, filterable ticket storage.
///
/// `fetch` returns rows ordered by the latest-activity expression,
/// descending, with the ticket id (descending) as tie-break.
pub trait TicketStore: Send + Sync {
    /// Create a new ticket in the unassigned state.
    fn create(&self, new: NewTicket) -> Result<Ticket, StoreError>;

    /// Get a ticket by id.
    fn get(&self, id: i64) -> Result<Option<Ticket>, StoreError>;

    /// Move a ticket to a new state, recording the matching milestone
    /// timestamp. Finished tickets accept only `Reentry`.
    fn update_state(&self, id: i64, new_state: TicketState) -> Result<Ticket, StoreError>;

    /// Permanently delete a ticket. Returns the deleted ticket.
    fn delete(&self, id: i64) -> Result<Ticket, StoreError>;

    /// Count tickets matching every clause.
    fn count(&self, clauses: &[FilterClause]) -> Result<u64, StoreError>;

    /// Fetch tickets matching every clause, ordered by latest activity.
    fn fetch(
        &self,
        clauses: &[FilterClause],
        limit: Option<u64>,
        offset: u64,
    ) -> Result<Vec<Ticket>, StoreError>;
}
