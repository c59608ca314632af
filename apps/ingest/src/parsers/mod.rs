//! Heuristic free-text parsers for listing fields.
//!
//! Both parsers are pure, never fail, and report unparseable input through
//! null fields or an `ambiguous` flag rather than errors; the normalizers
//! count those outcomes for the ingestion report.

pub mod location;
pub mod stipend;
