use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::filter::FilterClause;
use crate::metrics;
use crate::ticket::{ServiceKind, Ticket, TicketStore};

/// Label under which blank state/priority/city values are tallied.
const NONE_BUCKET: &str = "none";

/// Tally of search results by state, priority and city, for dashboards
/// that need counts without a second round trip.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub total: u64,
    pub by_state: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
    pub by_city: BTreeMap<String, u64>,
}

/// Unrestricted (non-paginated) ticket lookup.
///
/// Matches a wider field set than the ticket-list search clause and
/// keeps the same latest-activity ordering. Store failures degrade to
/// empty results.
pub struct SearchEngine {
    store: Arc<dyn TicketStore>,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    /// Find every ticket whose id, technician, reference, priority,
    /// client document, device identifier, product code, city or state
    /// contains `term`, optionally restricted to one service and capped
    /// at `limit` rows.
    pub fn search(
        &self,
        term: &str,
        service: Option<ServiceKind>,
        limit: Option<u64>,
    ) -> Vec<Ticket> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }

        let mut clauses = vec![FilterClause::AnyFieldContains(term.to_string())];
        if let Some(kind) = service {
            clauses.push(FilterClause::Service(kind));
        }

        match self.store.fetch(&clauses, limit, 0) {
            Ok(tickets) => tickets,
            Err(e) => {
                warn!(error = %e, term, "search degraded to empty result");
                metrics::READS_DEGRADED.with_label_values(&["search"]).inc();
                Vec::new()
            }
        }
    }

    /// "My open work matching X": the unrestricted search filtered to
    /// tickets assigned to the given technician document (compared with
    /// non-alphanumeric characters stripped) that are not yet finished.
    pub fn search_for_technician(
        &self,
        term: &str,
        technician_document: &str,
        limit: Option<u64>,
    ) -> Vec<Ticket> {
        let normalized = normalize_document(technician_document);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut tickets: Vec<Ticket> = self
            .search(term, None, None)
            .into_iter()
            .filter(|ticket| {
                !ticket.state.is_terminal()
                    && normalize_document(&ticket.technical_document) == normalized
            })
            .collect();
        if let Some(limit) = limit {
            tickets.truncate(limit as usize);
        }
        tickets
    }

    /// Tally search results by state, priority and city.
    pub fn summarize(&self, term: &str, service: Option<ServiceKind>) -> SearchSummary {
        let tickets = self.search(term, service, None);

        let mut by_state = BTreeMap::new();
        let mut by_priority = BTreeMap::new();
        let mut by_city = BTreeMap::new();
        for ticket in &tickets {
            bump(&mut by_state, ticket.state.as_str());
            bump(&mut by_priority, &ticket.priority);
            bump(&mut by_city, &ticket.city);
        }

        SearchSummary {
            total: tickets.len() as u64,
            by_state,
            by_priority,
            by_city,
        }
    }
}

fn bump(buckets: &mut BTreeMap<String, u64>, value: &str) {
    let key = if value.trim().is_empty() {
        NONE_BUCKET
    } else {
        value
    };
    *buckets.entry(key.to_string()).or_insert(0) += 1;
}

fn normalize_document(document: &str) -> String {
    document.chars().filter(|c| c.is_alphanumeric()).collect()
}
