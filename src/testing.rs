//! In-process engines and fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::TimeSeries;
use crate::engine::raw::TextField;
use crate::engine::{EngineArray, EngineCall, ModelEngine, RawEngineReply};
use crate::error::{ForecastError, Result};

/// Answers every call with a naive forecast (last value repeated) and an
/// exact in-sample fit, unless `fail_if` matches the call.
#[derive(Default)]
pub struct ScriptedEngine {
    pub calls: AtomicUsize,
    pub fail_if: Option<fn(&EngineCall) -> bool>,
    pub panic_if: Option<fn(&EngineCall) -> bool>,
    pub delay_if: Option<(fn(&EngineCall) -> bool, Duration)>,
    /// Report the point forecast as a one-column matrix.
    pub nested_mean: bool,
}

impl ScriptedEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelEngine for ScriptedEngine {
    fn fit_and_forecast(&self, call: &EngineCall) -> Result<RawEngineReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((pred, delay)) = self.delay_if {
            if pred(call) {
                std::thread::sleep(delay);
            }
        }
        if self.panic_if.is_some_and(|pred| pred(call)) {
            panic!("scripted engine panic");
        }
        if self.fail_if.is_some_and(|pred| pred(call)) {
            return Err(ForecastError::engine(&call.identifier, "scripted failure"));
        }
        Ok(naive_reply(call, self.nested_mean))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn naive_reply(call: &EngineCall, nested_mean: bool) -> RawEngineReply {
    let last = call
        .values
        .iter()
        .rev()
        .copied()
        .find(|v| !v.is_nan())
        .unwrap_or(f64::NAN);
    let mean = vec![last; call.horizon];
    let lower: Vec<f64> = mean.iter().map(|v| v - 1.0).collect();
    let upper: Vec<f64> = mean.iter().map(|v| v + 1.0).collect();
    let observed: Vec<f64> = call.values.iter().copied().filter(|v| !v.is_nan()).collect();

    let mean = if nested_mean {
        EngineArray::Nested(mean.into_iter().map(|v| vec![Some(v)]).collect())
    } else {
        EngineArray::flat(mean)
    };

    RawEngineReply {
        model: Some(serde_json::json!(format!("scripted {}", call.identifier))),
        method: Some(TextField::Many(vec!["Scripted".to_string()])),
        mean: Some(mean),
        lower: Some(EngineArray::Nested(lower.into_iter().map(|v| vec![Some(v)]).collect())),
        upper: Some(EngineArray::Nested(upper.into_iter().map(|v| vec![Some(v)]).collect())),
        level: Some(EngineArray::Flat(call.levels.iter().map(|l| Some(*l)).collect())),
        x: Some(EngineArray::flat(call.values.clone())),
        residuals: Some(EngineArray::flat(vec![0.0; observed.len()])),
        fitted: Some(EngineArray::flat(observed)),
    }
}

pub fn month(y: i32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// `n` consecutive month-start observations from `start`.
pub fn monthly(start: NaiveDateTime, values: Vec<f64>) -> TimeSeries {
    let index = crate::domain::Frequency::Monthly
        .step()
        .range(start, values.len())
        .unwrap();
    TimeSeries::new(index, values).unwrap()
}
