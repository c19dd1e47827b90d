use chrono::NaiveDateTime;

use crate::domain::{CalendarStep, ForecastResult, TimeSeries, resolve};
use crate::engine::{EngineArray, RawEngineOutput};
use crate::error::{ForecastError, Result};

/// Rebuild a date-indexed `ForecastResult` from a raw engine reply.
///
/// `trimmed` is the series exactly as it was sent to the engine. The forecast
/// starts one calendar step after its last index; fitted values and residuals
/// start at its first index and cover as many steps as it has observations.
/// Lengths are checked, never patched.
pub fn reconstruct(
    raw: &RawEngineOutput,
    trimmed: &TimeSeries,
    frequency_code: u32,
) -> Result<ForecastResult> {
    let step = resolve(frequency_code)?;
    let (Some(first), Some(last)) = (trimmed.first_index(), trimmed.last_index()) else {
        return Err(ForecastError::reconstruction("x", "trimmed series is empty"));
    };

    let x = raw.x.flatten("x")?;
    if x.len() != trimmed.len() {
        return Err(ForecastError::reconstruction(
            "x",
            format!(
                "engine echoed {} values for a series of {}",
                x.len(),
                trimmed.len()
            ),
        ));
    }

    let mean = raw.mean.flatten("mean")?;
    let forecast_start = step
        .next(last)
        .ok_or_else(|| ForecastError::reconstruction("predicted", "forecast start is out of calendar range"))?;
    let predicted = dated("predicted", step, forecast_start, mean)?;

    let observed = trimmed.observed_count();
    let fitted = dated("fitted", step, first, exact_len(&raw.fitted, "fitted", observed)?)?;
    let residuals = dated(
        "residuals",
        step,
        first,
        exact_len(&raw.residuals, "residuals", observed)?,
    )?;

    let full_fit = fitted.concat(&predicted).ok_or_else(|| {
        ForecastError::reconstruction(
            "full_fit",
            format!(
                "fitted segment ends at {} but the forecast starts at {forecast_start}",
                fitted.last_index().map(|t| t.to_string()).unwrap_or_default()
            ),
        )
    })?;
    let full_actuals = trimmed.concat(&predicted).ok_or_else(|| {
        ForecastError::reconstruction(
            "full_actuals",
            format!("series ends at {last} but the forecast starts at {forecast_start}"),
        )
    })?;

    let lower = exact_len(&raw.lower, "lower", predicted.len())?;
    let upper = exact_len(&raw.upper, "upper", predicted.len())?;

    Ok(ForecastResult {
        model: raw.model.clone(),
        method: raw.method.clone(),
        predicted,
        lower,
        upper,
        level: single_level(&raw.level)?,
        x: trimmed.clone(),
        residuals,
        fitted,
        full_fit,
        full_actuals,
    })
}

fn dated(
    field: &'static str,
    step: CalendarStep,
    start: NaiveDateTime,
    values: Vec<f64>,
) -> Result<TimeSeries> {
    let index = step.range(start, values.len()).ok_or_else(|| {
        ForecastError::reconstruction(field, format!("{} steps from {start} leave the calendar range", values.len()))
    })?;
    TimeSeries::new(index, values).map_err(|e| ForecastError::reconstruction(field, e.to_string()))
}

fn exact_len(array: &EngineArray, field: &'static str, expected: usize) -> Result<Vec<f64>> {
    let values = array.flatten(field)?;
    if values.len() != expected {
        return Err(ForecastError::reconstruction(
            field,
            format!("engine returned {} values, expected {expected}", values.len()),
        ));
    }
    Ok(values)
}

/// The one confidence level of the reply, truncated toward zero.
fn single_level(level: &EngineArray) -> Result<u32> {
    let values = level.flatten("level")?;
    match values.as_slice() {
        [v] if v.is_finite() && *v > 0.0 && *v < 100.0 => Ok(v.trunc() as u32),
        [v] => Err(ForecastError::reconstruction("level", format!("{v} is not a percentage"))),
        [] => Err(ForecastError::reconstruction("level", "no confidence level reported")),
        many => Err(ForecastError::reconstruction(
            "level",
            format!("expected one confidence level, got {}", many.len()),
        )),
    }
}
