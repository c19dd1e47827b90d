//! `forecast-fanout` library crate.
//!
//! Dispatches calendar-indexed series to an external model-fitting engine,
//! rebuilds the engine's flat arrays into dated sequences and fans table
//! columns out across workers:
//!
//! - `domain`: series, requests, results, frequencies, batch configuration
//! - `models`: model identifier classification
//! - `engine`: the engine capability, its backends and the invocation bridge
//! - `reconstruct`: dating fitted values, residuals and forecasts
//! - `batch`: scheduler capability and the per-column orchestrator
//! - `io`: wide CSV in, CSV/JSON out
//! - `app`: the `Forecaster` entry type

pub mod app;
pub mod batch;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod models;
pub mod reconstruct;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{ForecastInput, ForecastOutput, Forecaster};
pub use batch::{BatchResult, CancelToken, ForecastTable, InlineScheduler, Scheduler, ThreadPoolScheduler};
pub use domain::{BatchConfig, FailurePolicy, ForecastRequest, ForecastResult, SeriesTable, TimeSeries, View, ViewSelection};
pub use engine::{HttpEngine, ModelEngine, RscriptEngine, Serialized};
pub use error::{ForecastError, Result};
