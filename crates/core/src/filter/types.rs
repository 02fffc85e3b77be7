use chrono::{DateTime, Utc};

use crate::ticket::ServiceKind;

/// Ordered mapping of filter intents, as received from a caller.
///
/// Recognized keys: `search`, `state`, `state_not`, `city`, `priority`,
/// `date_from`, `date_to`.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    fields: Vec<(String, String)>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// How non-special city values are matched.
///
/// The accented-root special cases (medellín, bogotá) always match by
/// substring; this mode only governs every other city value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityMatch {
    /// `city = value`, used by the ticket-list views.
    Exact,
    /// Case-insensitive containment, used by the generic paginator.
    Substring,
}

/// A single typed predicate over the tickets table.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Case-insensitive substring OR across the ticket-list search
    /// columns: imei, client document, technician name, reference,
    /// product code and the id cast to text.
    Search(String),
    /// The wider nine-column variant used by the search engine; adds
    /// priority, city and state to [`FilterClause::Search`]'s columns.
    AnyFieldContains(String),
    State(String),
    StateNot(String),
    CityEquals(String),
    CityContains(String),
    Priority(String),
    /// Inclusive lower bound on the creation timestamp.
    CreatedFrom(DateTime<Utc>),
    /// Inclusive upper bound on the creation timestamp.
    CreatedTo(DateTime<Utc>),
    Service(ServiceKind),
}
