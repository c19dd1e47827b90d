//! Per-column fan-out over a table.
//!
//! Workflow:
//! 1. Resolve the view and the frequency (nothing is dispatched on failure).
//! 2. Submit one unit per column: trim, invoke the engine, reconstruct,
//!    extract the selected view.
//! 3. Join the units in slices so cancellation and the deadline are noticed.
//! 4. Apply the failure policy and outer-join the extracted views. Under
//!    `FailFast` the join stops at the first settled failure and the
//!    remaining units are cancelled.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::batch::{CancelToken, ForecastTable, JoinOutcome, Scheduler, TaskHandle};
use crate::domain::{BatchConfig, FailurePolicy, ForecastRequest, SeriesTable, TimeSeries, View, ViewSelection, resolve};
use crate::engine::{ModelEngine, invoke};
use crate::error::{ForecastError, Result};
use crate::reconstruct::reconstruct;

/// Longest single wait before cancellation and the deadline are re-checked.
const JOIN_SLICE: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub struct ColumnFailure {
    pub column: String,
    pub error: ForecastError,
}

#[derive(Debug)]
pub struct BatchResult {
    pub view: View,
    /// Every input column, in input order. Failed and pending columns are all
    /// missing.
    pub table: ForecastTable,
    pub failures: Vec<ColumnFailure>,
    /// Columns that had not completed when the join deadline passed.
    pub pending: Vec<String>,
}

impl BatchResult {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.pending.is_empty()
    }
}

/// What a unit sends back.
enum UnitOutcome {
    Done(Result<TimeSeries>),
    /// Cancelled before the engine call.
    Skipped,
}

/// Forecast every column of `table` and gather the selected view.
pub fn forecast_table<E, S>(
    engine: &Arc<E>,
    scheduler: &S,
    table: &SeriesTable,
    request: &ForecastRequest,
    selection: &ViewSelection,
    config: &BatchConfig,
    cancel: &CancelToken,
) -> Result<BatchResult>
where
    E: ModelEngine + ?Sized + 'static,
    S: Scheduler,
{
    let view = selection.resolve()?;
    resolve(request.frequency())?;

    tracing::info!(
        columns = table.len(),
        model = request.model(),
        horizon = request.horizon(),
        view = view.name(),
        policy = ?config.failure_policy,
        "dispatching batch"
    );
    let started = Instant::now();

    // Raised on deadline expiry so units that have not started stay idle.
    let expired = CancelToken::new();
    let request = Arc::new(request.clone());

    let handles: Vec<TaskHandle<UnitOutcome>> = table
        .iter()
        .map(|(name, series)| {
            let engine = Arc::clone(engine);
            let request = Arc::clone(&request);
            let series = series.clone();
            let column = name.to_string();
            let cancel = cancel.clone();
            let expired = expired.clone();
            scheduler.submit(move || {
                if cancel.is_cancelled() || expired.is_cancelled() {
                    return UnitOutcome::Skipped;
                }
                let t0 = Instant::now();
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    forecast_column(&*engine, &series, &request, view)
                }))
                .unwrap_or_else(|payload| {
                    Err(ForecastError::engine(
                        request.model(),
                        format!("unit panicked: {}", panic_message(payload.as_ref())),
                    ))
                });
                tracing::debug!(
                    column = %column,
                    ok = outcome.is_ok(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "unit finished"
                );
                UnitOutcome::Done(outcome)
            })
        })
        .collect();

    // A timeout past the end of the clock means no deadline.
    let deadline = config.join_timeout.and_then(|t| started.checked_add(t));
    let mut outcomes: Vec<Option<UnitOutcome>> = handles.iter().map(|_| None).collect();
    let mut waiting: Vec<usize> = (0..handles.len()).collect();

    while let Some(&head) = waiting.first() {
        if cancel.is_cancelled() {
            expired.cancel();
            let pending = names_of(table, &waiting);
            tracing::info!(outstanding = pending.len(), "batch cancelled");
            return Err(ForecastError::Cancelled { pending });
        }
        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            break;
        }
        let slice_end = now + JOIN_SLICE;
        let slice_end = deadline.map_or(slice_end, |d| d.min(slice_end));

        settle(&mut outcomes[head], handles[head].wait_until(slice_end), request.model());
        waiting.retain(|&i| {
            if outcomes[i].is_none() {
                settle(&mut outcomes[i], handles[i].try_poll(), request.model());
            }
            outcomes[i].is_none()
        });

        // Under FailFast one settled failure decides the batch.
        if config.failure_policy == FailurePolicy::FailFast
            && outcomes.iter().any(|o| matches!(o, Some(UnitOutcome::Done(Err(_)))))
        {
            break;
        }
    }

    if !waiting.is_empty() {
        expired.cancel();
    }

    let mut views: Vec<Option<TimeSeries>> = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    let mut pending = Vec::new();
    for ((name, _), outcome) in table.iter().zip(outcomes) {
        match outcome {
            Some(UnitOutcome::Done(Ok(series))) => views.push(Some(series)),
            Some(UnitOutcome::Done(Err(error))) => {
                tracing::warn!(column = name, error = %error, "column failed");
                failures.push(ColumnFailure {
                    column: name.to_string(),
                    error,
                });
                views.push(None);
            }
            Some(UnitOutcome::Skipped) | None => {
                tracing::warn!(column = name, "column did not complete");
                pending.push(name.to_string());
                views.push(None);
            }
        }
    }

    if config.failure_policy == FailurePolicy::FailFast {
        if let Some(first) = failures.drain(..).next() {
            return Err(first.error.in_column(first.column));
        }
        if !pending.is_empty() {
            return Err(ForecastError::Timeout { pending });
        }
    }

    let table = ForecastTable::outer_join(
        table
            .names()
            .map(str::to_string)
            .zip(views.iter().map(Option::as_ref)),
    );

    tracing::info!(
        columns = table.n_cols(),
        rows = table.n_rows(),
        failed = failures.len(),
        pending = pending.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch finished"
    );

    Ok(BatchResult {
        view,
        table,
        failures,
        pending,
    })
}

fn forecast_column<E: ModelEngine + ?Sized>(
    engine: &E,
    series: &TimeSeries,
    request: &ForecastRequest,
    view: View,
) -> Result<TimeSeries> {
    let invocation = invoke(engine, series, request)?;
    let result = reconstruct(&invocation.raw, &invocation.trimmed, request.frequency())?;
    Ok(result.view(view).clone())
}

fn settle(slot: &mut Option<UnitOutcome>, outcome: JoinOutcome<UnitOutcome>, model: &str) {
    match outcome {
        JoinOutcome::Ready(v) => *slot = Some(v),
        JoinOutcome::Lost => {
            *slot = Some(UnitOutcome::Done(Err(ForecastError::engine(
                model,
                "worker ended without a result",
            ))))
        }
        JoinOutcome::Pending => {}
    }
}

fn names_of(table: &SeriesTable, indices: &[usize]) -> Vec<String> {
    let names: Vec<&str> = table.names().collect();
    indices.iter().map(|&i| names[i].to_string()).collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
