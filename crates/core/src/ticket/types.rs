use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a repair ticket.
///
/// `Finished` is the single terminal state; a finished ticket can only
/// re-enter the workshop as `Reentry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    Unassigned,
    Assigned,
    /// Re-admission of a previously repaired device.
    Reentry,
    InProgress,
    InRevision,
    Finished,
}

impl TicketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketState::Unassigned => "unassigned",
            TicketState::Assigned => "assigned",
            TicketState::Reentry => "reentry",
            TicketState::InProgress => "in_progress",
            TicketState::InRevision => "in_revision",
            TicketState::Finished => "finished",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "unassigned" => Some(TicketState::Unassigned),
            "assigned" => Some(TicketState::Assigned),
            "reentry" => Some(TicketState::Reentry),
            "in_progress" => Some(TicketState::InProgress),
            "in_revision" => Some(TicketState::InRevision),
            "finished" => Some(TicketState::Finished),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketState::Finished)
    }

    /// Whether a ticket in this state may move to `next`.
    pub fn can_transition_to(&self, next: TicketState) -> bool {
        !self.is_terminal() || next == TicketState::Reentry
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which workflow a ticket belongs to.
///
/// Stored under the legacy single-character codes the upstream system
/// writes into the `service` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    TechnicalService,
    InternalRepair,
    Warranty,
}

impl ServiceKind {
    pub fn legacy_code(&self) -> &'static str {
        match self {
            ServiceKind::TechnicalService => "0",
            ServiceKind::InternalRepair => "1",
            ServiceKind::Warranty => "2",
        }
    }

    pub fn from_legacy_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(ServiceKind::TechnicalService),
            "1" => Some(ServiceKind::InternalRepair),
            "2" => Some(ServiceKind::Warranty),
            _ => None,
        }
    }
}

/// A repair/warranty/internal-service ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub state: TicketState,
    /// Free-form priority label ("Alta", "Media", ...).
    pub priority: String,
    pub technical_name: String,
    pub technical_document: String,
    pub document_client: String,
    pub product_code: String,
    /// Device identifier.
    pub imei: String,
    pub reference: String,
    pub city: String,
    pub service: ServiceKind,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub in_progress_at: Option<DateTime<Utc>>,
    pub in_revision_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// The canonical ordering key: first non-null milestone in priority
    /// order finished, in-revision, in-progress, assigned; falls back to
    /// the creation timestamp. Administrators see the most recently
    /// active ticket first.
    pub fn latest_activity(&self) -> DateTime<Utc> {
        self.finished_at
            .or(self.in_revision_at)
            .or(self.in_progress_at)
            .or(self.assigned_at)
            .unwrap_or(self.created_at)
    }
}

/// Request to create a new ticket. New tickets start unassigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub priority: String,
    pub technical_name: String,
    pub technical_document: String,
    pub document_client: String,
    pub product_code: String,
    pub imei: String,
    pub reference: String,
    pub city: String,
    pub service: ServiceKind,
    #[serde(default)]
    pub comment: Option<String>,
}
