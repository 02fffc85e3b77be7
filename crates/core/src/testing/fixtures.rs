//! Fixture builders with reasonable defaults.

use chrono::{TimeZone, Utc};

use crate::ticket::{NewTicket, ServiceKind, Ticket, TicketState};

/// Build a ticket with the given id and device identifier; everything
/// else gets workshop-plausible defaults and a fixed creation date.
pub fn ticket(id: i64, imei: &str) -> Ticket {
    Ticket {
        id,
        state: TicketState::Unassigned,
        priority: "Media".to_string(),
        technical_name: "Laura Gomez".to_string(),
        technical_document: "100.200.300".to_string(),
        document_client: "900123456".to_string(),
        product_code: "P-1001".to_string(),
        imei: imei.to_string(),
        reference: "Galaxy S21".to_string(),
        city: "Medellín".to_string(),
        service: ServiceKind::TechnicalService,
        comment: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        assigned_at: None,
        in_progress_at: None,
        in_revision_at: None,
        finished_at: None,
    }
}

/// Build a create request matching [`ticket`]'s defaults.
pub fn new_ticket(imei: &str) -> NewTicket {
    NewTicket {
        priority: "Media".to_string(),
        technical_name: "Laura Gomez".to_string(),
        technical_document: "100.200.300".to_string(),
        document_client: "900123456".to_string(),
        product_code: "P-1001".to_string(),
        imei: imei.to_string(),
        reference: "Galaxy S21".to_string(),
        city: "Medellín".to_string(),
        service: ServiceKind::TechnicalService,
        comment: None,
    }
}
