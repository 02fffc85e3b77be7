//! In-memory [`TicketStore`] with error injection.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use crate::filter::FilterClause;
use crate::ticket::{NewTicket, StoreError, Ticket, TicketState, TicketStore};

/// In-memory ticket store mirroring the SQLite store's semantics:
/// conjunctive clause matching, latest-activity ordering with an id
/// tie-break, and the terminal-state transition guard.
#[derive(Default)]
pub struct MockTicketStore {
    tickets: Mutex<Vec<Ticket>>,
    next_id: AtomicI64,
    fail_reads: AtomicBool,
}

impl MockTicketStore {
    pub fn new() -> Self {
        Self {
            tickets: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Pre-populate the store.
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        let next = tickets.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            tickets: Mutex::new(tickets),
            next_id: AtomicI64::new(next),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Make `count` and `fetch` fail until reset, for exercising the
    /// engines' degrade policy.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn push(&self, ticket: Ticket) {
        self.tickets.lock().unwrap().push(ticket);
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StoreError::Database("injected read failure".to_string()))
        } else {
            Ok(())
        }
    }
}

fn matches(ticket: &Ticket, clause: &FilterClause) -> bool {
    fn contains_ci(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    match clause {
        FilterClause::Search(term) => {
            let id_text = ticket.id.to_string();
            [
                ticket.imei.as_str(),
                ticket.document_client.as_str(),
                ticket.technical_name.as_str(),
                ticket.reference.as_str(),
                ticket.product_code.as_str(),
                id_text.as_str(),
            ]
            .iter()
            .any(|field| contains_ci(field, term))
        }
        FilterClause::AnyFieldContains(term) => {
            let id_text = ticket.id.to_string();
            [
                id_text.as_str(),
                ticket.technical_name.as_str(),
                ticket.reference.as_str(),
                ticket.priority.as_str(),
                ticket.document_client.as_str(),
                ticket.imei.as_str(),
                ticket.product_code.as_str(),
                ticket.city.as_str(),
                ticket.state.as_str(),
            ]
            .iter()
            .any(|field| contains_ci(field, term))
        }
        FilterClause::State(state) => ticket.state.as_str() == state,
        FilterClause::StateNot(state) => ticket.state.as_str() != state,
        FilterClause::CityEquals(city) => ticket.city == *city,
        FilterClause::CityContains(root) => contains_ci(&ticket.city, root),
        FilterClause::Priority(priority) => ticket.priority == *priority,
        FilterClause::CreatedFrom(from) => ticket.created_at >= *from,
        FilterClause::CreatedTo(to) => ticket.created_at <= *to,
        FilterClause::Service(kind) => ticket.service == *kind,
    }
}

impl TicketStore for MockTicketStore {
    fn create(&self, new: NewTicket) -> Result<Ticket, StoreError> {
        let ticket = Ticket {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            state: TicketState::Unassigned,
            priority: new.priority,
            technical_name: new.technical_name,
            technical_document: new.technical_document,
            document_client: new.document_client,
            product_code: new.product_code,
            imei: new.imei,
            reference: new.reference,
            city: new.city,
            service: new.service,
            comment: new.comment,
            created_at: Utc::now(),
            assigned_at: None,
            in_progress_at: None,
            in_revision_at: None,
            finished_at: None,
        };
        self.tickets.lock().unwrap().push(ticket.clone());
        Ok(ticket)
    }

    fn get(&self, id: i64) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    fn update_state(&self, id: i64, new_state: TicketState) -> Result<Ticket, StoreError> {
        let mut tickets = self.tickets.lock().unwrap();
        let ticket = tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if !ticket.state.can_transition_to(new_state) {
            return Err(StoreError::InvalidState {
                ticket_id: id,
                current_state: ticket.state.to_string(),
                requested: new_state.to_string(),
            });
        }

        ticket.state = new_state;
        let now = Utc::now();
        match new_state {
            TicketState::Assigned => ticket.assigned_at = Some(now),
            TicketState::InProgress => ticket.in_progress_at = Some(now),
            TicketState::InRevision => ticket.in_revision_at = Some(now),
            TicketState::Finished => ticket.finished_at = Some(now),
            TicketState::Unassigned | TicketState::Reentry => {}
        }
        Ok(ticket.clone())
    }

    fn delete(&self, id: i64) -> Result<Ticket, StoreError> {
        let mut tickets = self.tickets.lock().unwrap();
        let position = tickets
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(tickets.remove(position))
    }

    fn count(&self, clauses: &[FilterClause]) -> Result<u64, StoreError> {
        self.check_reads()?;
        let tickets = self.tickets.lock().unwrap();
        Ok(tickets
            .iter()
            .filter(|t| clauses.iter().all(|c| matches(t, c)))
            .count() as u64)
    }

    fn fetch(
        &self,
        clauses: &[FilterClause],
        limit: Option<u64>,
        offset: u64,
    ) -> Result<Vec<Ticket>, StoreError> {
        self.check_reads()?;
        let tickets = self.tickets.lock().unwrap();
        let mut matching: Vec<Ticket> = tickets
            .iter()
            .filter(|t| clauses.iter().all(|c| matches(t, c)))
            .cloned()
            .collect();
        matching.sort_by_key(|t| (Reverse(t.latest_activity()), Reverse(t.id)));

        let limit = limit.unwrap_or(u64::MAX) as usize;
        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit)
            .collect())
    }
}
