//! Input/output helpers.
//!
//! - wide CSV ingest into a `SeriesTable` (`ingest`)
//! - batch table CSV and single-result JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
