//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - frequency codes and calendar steps (`Frequency`, `CalendarStep`)
//! - series, tables, requests and results (`types`)
//! - batch configuration (`BatchConfig`, `FailurePolicy`)

pub mod config;
pub mod frequency;
pub mod types;

pub use config::*;
pub use frequency::{CalendarStep, Frequency, resolve};
pub use types::*;
