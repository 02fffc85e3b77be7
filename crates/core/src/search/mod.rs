//! Unbounded ordered search across the whole ticket field set, plus
//! aggregate summaries and term validation.

mod engine;
mod validate;

pub use engine::{SearchEngine, SearchSummary};
pub use validate::{validate_term, TermValidation};
