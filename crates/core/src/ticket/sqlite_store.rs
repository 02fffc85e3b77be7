//! SQLite-backed ticket store running over the connection pool.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::params;

use crate::filter::FilterClause;
use crate::pool::ConnectionPool;
use crate::ticket::{NewTicket, ServiceKind, Ticket, TicketState};

use super::{StoreError, TicketStore};

const TICKET_COLUMNS: &str = "id, state, priority, technical_name, technical_document, \
     document_client, product_code, imei, reference, city, service, comment, \
     created_at, assigned_at, in_progress_at, in_revision_at, finished_at";

/// The canonical ordering rule: first non-null milestone in priority
/// order, falling back to the creation timestamp; id breaks ties so a
/// page boundary never shuffles.
const LATEST_ACTIVITY_ORDER: &str =
    "COALESCE(finished_at, in_revision_at, in_progress_at, assigned_at, created_at) DESC, id DESC";

/// Columns covered by the ticket-list `search` clause.
const SEARCH_COLUMNS: [&str; 6] = [
    "imei",
    "document_client",
    "technical_name",
    "reference",
    "product_code",
    "CAST(id AS TEXT)",
];

/// Columns covered by the search engine's wide clause.
const WIDE_SEARCH_COLUMNS: [&str; 9] = [
    "CAST(id AS TEXT)",
    "technical_name",
    "reference",
    "priority",
    "document_client",
    "imei",
    "product_code",
    "city",
    "state",
];

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteTicketStore {
    /// Create the store, initializing the tickets schema if needed.
    pub fn new(pool: Arc<ConnectionPool>) -> Result<Self, StoreError> {
        let guard = pool.acquire()?;
        guard
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS tickets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    state TEXT NOT NULL,
                    priority TEXT NOT NULL,
                    technical_name TEXT NOT NULL,
                    technical_document TEXT NOT NULL,
                    document_client TEXT NOT NULL,
                    product_code TEXT NOT NULL,
                    imei TEXT NOT NULL,
                    reference TEXT NOT NULL,
                    city TEXT NOT NULL,
                    service TEXT NOT NULL,
                    comment TEXT,
                    created_at TEXT NOT NULL,
                    assigned_at TEXT,
                    in_progress_at TEXT,
                    in_revision_at TEXT,
                    finished_at TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_tickets_service_state ON tickets(service, state);
                CREATE INDEX IF NOT EXISTS idx_tickets_city ON tickets(city);
                CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at);
                "#,
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        drop(guard);
        Ok(Self { pool })
    }

    fn build_where_clause(clauses: &[FilterClause]) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        for clause in clauses {
            match clause {
                FilterClause::Search(term) => {
                    conditions.push(like_any(&SEARCH_COLUMNS, term, &mut params));
                }
                FilterClause::AnyFieldContains(term) => {
                    conditions.push(like_any(&WIDE_SEARCH_COLUMNS, term, &mut params));
                }
                FilterClause::State(state) => {
                    conditions.push("state = ?".to_string());
                    params.push(Value::Text(state.clone()));
                }
                FilterClause::StateNot(state) => {
                    conditions.push("state != ?".to_string());
                    params.push(Value::Text(state.clone()));
                }
                FilterClause::CityEquals(city) => {
                    conditions.push("city = ?".to_string());
                    params.push(Value::Text(city.clone()));
                }
                FilterClause::CityContains(root) => {
                    conditions.push("LOWER(city) LIKE ?".to_string());
                    params.push(Value::Text(format!("%{}%", root.to_lowercase())));
                }
                FilterClause::Priority(priority) => {
                    conditions.push("priority = ?".to_string());
                    params.push(Value::Text(priority.clone()));
                }
                FilterClause::CreatedFrom(from) => {
                    conditions.push("created_at >= ?".to_string());
                    params.push(Value::Text(ts(*from)));
                }
                FilterClause::CreatedTo(to) => {
                    conditions.push("created_at <= ?".to_string());
                    params.push(Value::Text(ts(*to)));
                }
                FilterClause::Service(kind) => {
                    conditions.push("service = ?".to_string());
                    params.push(Value::Text(kind.legacy_code().to_string()));
                }
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let state_label: String = row.get(1)?;
        let service_code: String = row.get(10)?;
        let created_at_str: String = row.get(12)?;

        Ok(Ticket {
            id: row.get(0)?,
            state: TicketState::parse(&state_label).unwrap_or(TicketState::Unassigned),
            priority: row.get(2)?,
            technical_name: row.get(3)?,
            technical_document: row.get(4)?,
            document_client: row.get(5)?,
            product_code: row.get(6)?,
            imei: row.get(7)?,
            reference: row.get(8)?,
            city: row.get(9)?,
            service: ServiceKind::from_legacy_code(&service_code)
                .unwrap_or(ServiceKind::TechnicalService),
            comment: row.get(11)?,
            created_at: parse_ts(&created_at_str).unwrap_or_else(Utc::now),
            assigned_at: parse_opt_ts(row.get(13)?),
            in_progress_at: parse_opt_ts(row.get(14)?),
            in_revision_at: parse_opt_ts(row.get(15)?),
            finished_at: parse_opt_ts(row.get(16)?),
        })
    }

    fn get_inner(&self, guard: &rusqlite::Connection, id: i64) -> Result<Ticket, StoreError> {
        let result = guard.query_row(
            &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"),
            params![id],
            Self::row_to_ticket,
        );
        match result {
            Ok(ticket) => Ok(ticket),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound(id)),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, new: NewTicket) -> Result<Ticket, StoreError> {
        let guard = self.pool.acquire()?;
        let now = Utc::now();
        let state = TicketState::Unassigned;

        guard
            .execute(
                "INSERT INTO tickets (state, priority, technical_name, technical_document, \
                 document_client, product_code, imei, reference, city, service, comment, \
                 created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    state.as_str(),
                    new.priority,
                    new.technical_name,
                    new.technical_document,
                    new.document_client,
                    new.product_code,
                    new.imei,
                    new.reference,
                    new.city,
                    new.service.legacy_code(),
                    new.comment,
                    ts(now),
                ],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let id = guard.last_insert_rowid();
        Ok(Ticket {
            id,
            state,
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
            // Round-trip through the stored encoding so the returned
            // value matches a later re-read exactly.
            created_at: parse_ts(&ts(now)).unwrap_or(now),
            assigned_at: None,
            in_progress_at: None,
            in_revision_at: None,
            finished_at: None,
        })
    }

    fn get(&self, id: i64) -> Result<Option<Ticket>, StoreError> {
        let guard = self.pool.acquire()?;
        match self.get_inner(&guard, id) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn update_state(&self, id: i64, new_state: TicketState) -> Result<Ticket, StoreError> {
        let guard = self.pool.acquire()?;
        let mut current = self.get_inner(&guard, id)?;

        if !current.state.can_transition_to(new_state) {
            return Err(StoreError::InvalidState {
                ticket_id: id,
                current_state: current.state.to_string(),
                requested: new_state.to_string(),
            });
        }

        let now = Utc::now();
        let milestone = match new_state {
            TicketState::Assigned => Some("assigned_at"),
            TicketState::InProgress => Some("in_progress_at"),
            TicketState::InRevision => Some("in_revision_at"),
            TicketState::Finished => Some("finished_at"),
            // Unassigned and re-entry record no milestone.
            TicketState::Unassigned | TicketState::Reentry => None,
        };

        match milestone {
            Some(column) => guard
                .execute(
                    &format!("UPDATE tickets SET state = ?, {column} = ? WHERE id = ?"),
                    params![new_state.as_str(), ts(now), id],
                )
                .map_err(|e| StoreError::Database(e.to_string()))?,
            None => guard
                .execute(
                    "UPDATE tickets SET state = ? WHERE id = ?",
                    params![new_state.as_str(), id],
                )
                .map_err(|e| StoreError::Database(e.to_string()))?,
        };

        current.state = new_state;
        let recorded = parse_ts(&ts(now)).unwrap_or(now);
        match new_state {
            TicketState::Assigned => current.assigned_at = Some(recorded),
            TicketState::InProgress => current.in_progress_at = Some(recorded),
            TicketState::InRevision => current.in_revision_at = Some(recorded),
            TicketState::Finished => current.finished_at = Some(recorded),
            TicketState::Unassigned | TicketState::Reentry => {}
        }
        Ok(current)
    }

    fn delete(&self, id: i64) -> Result<Ticket, StoreError> {
        let guard = self.pool.acquire()?;
        let ticket = self.get_inner(&guard, id)?;
        guard
            .execute("DELETE FROM tickets WHERE id = ?", params![id])
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(ticket)
    }

    fn count(&self, clauses: &[FilterClause]) -> Result<u64, StoreError> {
        let guard = self.pool.acquire()?;
        let (where_clause, params) = Self::build_where_clause(clauses);
        let sql = format!("SELECT COUNT(*) FROM tickets {where_clause}");

        let count: i64 = guard
            .query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| {
                row.get(0)
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(count as u64)
    }

    fn fetch(
        &self,
        clauses: &[FilterClause],
        limit: Option<u64>,
        offset: u64,
    ) -> Result<Vec<Ticket>, StoreError> {
        let guard = self.pool.acquire()?;
        let (where_clause, mut params) = Self::build_where_clause(clauses);
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets {where_clause} \
             ORDER BY {LATEST_ACTIVITY_ORDER} LIMIT ? OFFSET ?"
        );
        // LIMIT -1 means unbounded in SQLite.
        params.push(Value::Integer(limit.map(|l| l as i64).unwrap_or(-1)));
        params.push(Value::Integer(offset as i64));

        let mut stmt = guard
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), Self::row_to_ticket)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(tickets)
    }
}

fn like_any(columns: &[&str], term: &str, params: &mut Vec<Value>) -> String {
    let pattern = format!("%{}%", term.to_lowercase());
    let conditions: Vec<String> = columns
        .iter()
        .map(|column| format!("LOWER({column}) LIKE ?"))
        .collect();
    for _ in columns {
        params.push(Value::Text(pattern.clone()));
    }
    format!("({})", conditions.join(" OR "))
}

/// Uniform timestamp encoding so text comparison and COALESCE ordering
/// behave like timestamp comparison.
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_opt_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    value.as_deref().and_then(parse_ts)
}
