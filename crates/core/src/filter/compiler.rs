use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use super::{CityMatch, FilterClause, FilterSpec};

/// Pure translation from a [`FilterSpec`] into predicate clauses.
///
/// Each recognized key yields at most one clause; the store combines
/// clauses conjunctively. `search` expands into a disjunction internally.
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler {
    city_match: CityMatch,
}

impl FilterCompiler {
    pub fn new(city_match: CityMatch) -> Self {
        Self { city_match }
    }

    pub fn compile(&self, spec: &FilterSpec) -> Vec<FilterClause> {
        spec.iter()
            .filter_map(|(key, value)| self.compile_field(key, value))
            .collect()
    }

    fn compile_field(&self, key: &str, value: &str) -> Option<FilterClause> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        match key {
            "search" => Some(FilterClause::Search(value.to_string())),
            "state" => Some(FilterClause::State(value.to_string())),
            "state_not" => Some(FilterClause::StateNot(value.to_string())),
            "city" => Some(self.compile_city(value)),
            "priority" => Some(FilterClause::Priority(value.to_string())),
            "date_from" => match parse_date(value) {
                Some(date) => Some(FilterClause::CreatedFrom(date)),
                None => {
                    debug!(value, "unparseable date_from dropped");
                    None
                }
            },
            "date_to" => match parse_date(value) {
                Some(date) => Some(FilterClause::CreatedTo(date)),
                None => {
                    debug!(value, "unparseable date_to dropped");
                    None
                }
            },
            other => {
                debug!(key = other, "unrecognized filter key ignored");
                None
            }
        }
    }

    /// Cities with accented spellings match on a root so that
    /// "Medellín" and "Medellin" find the same rows regardless of how
    /// the stored value was typed.
    fn compile_city(&self, value: &str) -> FilterClause {
        let folded = value.to_lowercase();
        if folded == "medellin" || folded == "medellín" {
            FilterClause::CityContains("medell".to_string())
        } else if folded == "bogota" || folded == "bogotá" {
            FilterClause::CityContains("bogot".to_string())
        } else {
            match self.city_match {
                CityMatch::Exact => FilterClause::CityEquals(value.to_string()),
                CityMatch::Substring => FilterClause::CityContains(value.to_string()),
            }
        }
    }
}

/// Accepts `%Y-%m-%d` (midnight UTC) or RFC 3339.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc));
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn exact() -> FilterCompiler {
        FilterCompiler::new(CityMatch::Exact)
    }

    #[test]
    fn test_every_recognized_key_compiles() {
        let spec = FilterSpec::new()
            .with("search", "356789")
            .with("state", "assigned")
            .with("state_not", "finished")
            .with("city", "Cali")
            .with("priority", "Alta")
            .with("date_from", "2024-01-01")
            .with("date_to", "2024-12-31");

        let clauses = exact().compile(&spec);
        assert_eq!(clauses.len(), 7);
        assert_eq!(clauses[0], FilterClause::Search("356789".to_string()));
        assert_eq!(clauses[1], FilterClause::State("assigned".to_string()));
        assert_eq!(clauses[2], FilterClause::StateNot("finished".to_string()));
        assert_eq!(clauses[3], FilterClause::CityEquals("Cali".to_string()));
        assert_eq!(clauses[4], FilterClause::Priority("Alta".to_string()));
        assert_eq!(
            clauses[5],
            FilterClause::CreatedFrom(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            clauses[6],
            FilterClause::CreatedTo(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_blank_values_are_no_ops() {
        let spec = FilterSpec::new()
            .with("search", "")
            .with("state", "   ")
            .with("city", "\t");
        assert!(exact().compile(&spec).is_empty());
    }

    #[test]
    fn test_unrecognized_keys_are_no_ops() {
        let spec = FilterSpec::new().with("color", "blue");
        assert!(exact().compile(&spec).is_empty());
    }

    #[test]
    fn test_city_special_roots_ignore_accents_and_case() {
        for spelling in ["medellin", "Medellín", "MEDELLÍN", "MEDELLIN"] {
            let clauses = exact().compile(&FilterSpec::new().with("city", spelling));
            assert_eq!(
                clauses,
                vec![FilterClause::CityContains("medell".to_string())],
                "spelling {spelling:?}"
            );
        }
        for spelling in ["bogota", "Bogotá"] {
            let clauses = exact().compile(&FilterSpec::new().with("city", spelling));
            assert_eq!(
                clauses,
                vec![FilterClause::CityContains("bogot".to_string())],
                "spelling {spelling:?}"
            );
        }
    }

    #[test]
    fn test_city_mode_governs_other_values() {
        let spec = FilterSpec::new().with("city", "Cali");

        let clauses = FilterCompiler::new(CityMatch::Exact).compile(&spec);
        assert_eq!(clauses, vec![FilterClause::CityEquals("Cali".to_string())]);

        let clauses = FilterCompiler::new(CityMatch::Substring).compile(&spec);
        assert_eq!(clauses, vec![FilterClause::CityContains("Cali".to_string())]);
    }

    #[test]
    fn test_unparseable_dates_are_dropped() {
        let spec = FilterSpec::new()
            .with("date_from", "tomorrow")
            .with("date_to", "31/12/2024");
        assert!(exact().compile(&spec).is_empty());
    }

    #[test]
    fn test_rfc3339_dates_accepted() {
        let spec = FilterSpec::new().with("date_from", "2024-06-15T10:30:00Z");
        let clauses = exact().compile(&spec);
        assert_eq!(
            clauses,
            vec![FilterClause::CreatedFrom(
                Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
            )]
        );
    }

    #[test]
    fn test_search_value_is_trimmed() {
        let spec = FilterSpec::new().with("search", "  356789  ");
        let clauses = exact().compile(&spec);
        assert_eq!(clauses, vec![FilterClause::Search("356789".to_string())]);
    }
}
