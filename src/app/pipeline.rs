//! Shared per-series and per-file workflows used by `Forecaster`.
//!
//! Single series: frequency check -> trim + engine call -> reconstruction.
//! CSV file: ingest -> batch fan-out -> table export.

use std::path::Path;
use std::sync::Arc;

use crate::batch::{BatchResult, CancelToken, Scheduler, forecast_table};
use crate::domain::{BatchConfig, ForecastRequest, ForecastResult, TimeSeries, ViewSelection, resolve};
use crate::engine::{ModelEngine, invoke};
use crate::error::Result;
use crate::io::{read_table_csv, write_table_csv};
use crate::reconstruct::reconstruct;

/// Forecast one series. Errors are returned as-is (nothing is per-column here).
pub fn forecast_series<E: ModelEngine + ?Sized>(
    engine: &E,
    series: &TimeSeries,
    request: &ForecastRequest,
) -> Result<ForecastResult> {
    // An unknown frequency must not cost an engine call.
    resolve(request.frequency())?;

    let invocation = invoke(engine, series, request)?;
    let result = reconstruct(&invocation.raw, &invocation.trimmed, request.frequency())?;

    tracing::debug!(
        model = request.model(),
        method = %result.method,
        fitted = result.fitted.len(),
        predicted = result.predicted.len(),
        "series forecast"
    );
    Ok(result)
}

/// Forecast every column of a wide CSV file and write the selected view to
/// `output`.
#[allow(clippy::too_many_arguments)]
pub fn forecast_csv<E, S>(
    engine: &Arc<E>,
    scheduler: &S,
    config: &BatchConfig,
    cancel: &CancelToken,
    input: &Path,
    output: &Path,
    request: &ForecastRequest,
    selection: &ViewSelection,
) -> Result<BatchResult>
where
    E: ModelEngine + ?Sized + 'static,
    S: Scheduler,
{
    let table = read_table_csv(input)?;
    let result = forecast_table(engine, scheduler, &table, request, selection, config, cancel)?;
    write_table_csv(output, &result.table)?;
    Ok(result)
}
