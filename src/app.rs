//! Top-level entry type.
//!
//! `Forecaster` bundles an engine, a scheduler and the batch configuration,
//! and accepts either a single series or a table:
//! - a series returns the full `ForecastResult`
//! - a table returns one selected view per column, aligned by date

use std::path::Path;
use std::sync::Arc;

use crate::batch::{BatchResult, CancelToken, Scheduler, ThreadPoolScheduler};
use crate::domain::{BatchConfig, ForecastRequest, ForecastResult, SeriesTable, TimeSeries, ViewSelection};
use crate::engine::{ModelEngine, RscriptEngine};
use crate::error::Result;

pub mod pipeline;

/// What to forecast.
#[derive(Debug, Clone)]
pub enum ForecastInput {
    Series(TimeSeries),
    Table(SeriesTable),
}

impl From<TimeSeries> for ForecastInput {
    fn from(series: TimeSeries) -> Self {
        ForecastInput::Series(series)
    }
}

impl From<SeriesTable> for ForecastInput {
    fn from(table: SeriesTable) -> Self {
        ForecastInput::Table(table)
    }
}

#[derive(Debug)]
pub enum ForecastOutput {
    Series(ForecastResult),
    Table(BatchResult),
}

impl ForecastOutput {
    pub fn into_series(self) -> Option<ForecastResult> {
        match self {
            ForecastOutput::Series(r) => Some(r),
            ForecastOutput::Table(_) => None,
        }
    }

    pub fn into_table(self) -> Option<BatchResult> {
        match self {
            ForecastOutput::Table(r) => Some(r),
            ForecastOutput::Series(_) => None,
        }
    }
}

/// Holds no per-run state: every call gets its own cancel token (a fresh one
/// unless the caller passes theirs), so a cancelled run never affects the next.
pub struct Forecaster<E: ?Sized, S> {
    engine: Arc<E>,
    scheduler: S,
    config: BatchConfig,
}

impl Forecaster<RscriptEngine, ThreadPoolScheduler> {
    /// R backend and a worker pool, both configured from the environment
    /// (`.env` supported).
    pub fn from_env() -> Result<Self> {
        let config = BatchConfig::from_env()?;
        let scheduler = ThreadPoolScheduler::from_config(&config)?;
        Ok(Self::new(Arc::new(RscriptEngine::from_env()), scheduler, config))
    }
}

impl<E, S> Forecaster<E, S>
where
    E: ModelEngine + ?Sized + 'static,
    S: Scheduler,
{
    pub fn new(engine: Arc<E>, scheduler: S, config: BatchConfig) -> Self {
        Self {
            engine,
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn forecast_series(&self, series: &TimeSeries, request: &ForecastRequest) -> Result<ForecastResult> {
        pipeline::forecast_series(&*self.engine, series, request)
    }

    pub fn forecast_table(
        &self,
        table: &SeriesTable,
        request: &ForecastRequest,
        selection: &ViewSelection,
        cancel: &CancelToken,
    ) -> Result<BatchResult> {
        crate::batch::forecast_table(
            &self.engine,
            &self.scheduler,
            table,
            request,
            selection,
            &self.config,
            cancel,
        )
    }

    /// Single entry point. `selection` only applies to tables.
    pub fn run(
        &self,
        input: &ForecastInput,
        request: &ForecastRequest,
        selection: &ViewSelection,
    ) -> Result<ForecastOutput> {
        self.run_with_cancel(input, request, selection, &CancelToken::new())
    }

    /// `run` with a caller-held token; cancelling it stops a table batch.
    pub fn run_with_cancel(
        &self,
        input: &ForecastInput,
        request: &ForecastRequest,
        selection: &ViewSelection,
        cancel: &CancelToken,
    ) -> Result<ForecastOutput> {
        match input {
            ForecastInput::Series(series) => self.forecast_series(series, request).map(ForecastOutput::Series),
            ForecastInput::Table(table) => self
                .forecast_table(table, request, selection, cancel)
                .map(ForecastOutput::Table),
        }
    }

    pub fn forecast_csv(
        &self,
        input: &Path,
        output: &Path,
        request: &ForecastRequest,
        selection: &ViewSelection,
        cancel: &CancelToken,
    ) -> Result<BatchResult> {
        pipeline::forecast_csv(
            &self.engine,
            &self.scheduler,
            &self.config,
            cancel,
            input,
            output,
            request,
            selection,
        )
    }
}
