//! Series reconstruction.
//!
//! Responsibilities:
//!
//! - date the point forecast from one step after the last observation
//! - date fitted values and residuals from the first observation
//! - join the historical and forecast segments without gap or overlap

pub mod reconstructor;

pub use reconstructor::*;
