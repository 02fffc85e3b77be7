//! Filter intents and their compilation into typed predicate clauses.
//!
//! A [`FilterSpec`] is the stringly request-side view (query parameters,
//! form fields); [`FilterCompiler`] turns it into [`FilterClause`] values
//! that the ticket store renders into SQL. Blank values and unrecognized
//! keys compile to nothing.

mod compiler;
mod types;

pub use compiler::FilterCompiler;
pub use types::{CityMatch, FilterClause, FilterSpec};
