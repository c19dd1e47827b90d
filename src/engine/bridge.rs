//! Model invocation bridge: one series, one engine call.

use crate::domain::{ForecastRequest, TimeSeries};
use crate::engine::{EngineCall, ModelEngine, RawEngineOutput};
use crate::error::{ForecastError, Result};

/// A trimmed series together with the engine's complete reply for it.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub trimmed: TimeSeries,
    pub raw: RawEngineOutput,
}

/// Trim `series`, run the request's model on it and require a complete reply.
///
/// The call template (direct vs fit-then-forecast) follows from the
/// classified model identifier. No caching, no retry.
pub fn invoke<E: ModelEngine + ?Sized>(
    engine: &E,
    series: &TimeSeries,
    request: &ForecastRequest,
) -> Result<Invocation> {
    let trimmed = series.trimmed().ok_or_else(|| {
        ForecastError::InvalidInput("Series has no non-missing observations.".to_string())
    })?;

    let call = EngineCall::new(request, &trimmed);
    tracing::debug!(
        engine = engine.name(),
        model = %call.identifier,
        family = call.model.family_name(),
        n = call.values.len(),
        horizon = call.horizon,
        "invoking engine"
    );

    let reply = engine.fit_and_forecast(&call).map_err(|e| match e {
        e @ ForecastError::EngineInvocation { .. } => e,
        other => ForecastError::engine(request.model(), other.to_string()),
    })?;
    let raw = reply.into_output(request.model())?;

    Ok(Invocation { trimmed, raw })
}
