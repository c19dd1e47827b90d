//! Batch fan-out and gather.
//!
//! Responsibilities:
//!
//! - submit one forecast unit per table column to a scheduler
//! - join the units under an optional deadline and a cancel token
//! - extract one view per column and outer-join them by date

pub mod cancel;
pub mod orchestrator;
pub mod scheduler;
pub mod table;

pub use cancel::*;
pub use orchestrator::*;
pub use scheduler::*;
pub use table::*;
