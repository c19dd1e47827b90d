//! External modeling engines.
//!
//! The engine is a black box: "fit model M to series S, return the forecast,
//! intervals, fitted values and residuals". Everything above this module talks
//! to it only through `ModelEngine`.
//!
//! - `raw`: call and reply shapes
//! - `bridge`: trims a series, builds the call, validates the reply
//! - `rscript`: runs the R `forecast` package through an `Rscript` subprocess
//! - `http`: posts calls to a remote modeling service
//! - `serialized`: lock wrapper for bindings that are not reentrant

use std::sync::Arc;

use crate::error::Result;

pub mod bridge;
pub mod http;
pub mod raw;
pub mod rscript;
pub mod serialized;

pub use bridge::{Invocation, invoke};
pub use http::HttpEngine;
pub use raw::{EngineArray, EngineCall, REQUIRED_FIELDS, RawEngineOutput, RawEngineReply};
pub use rscript::RscriptEngine;
pub use serialized::Serialized;

/// A fit-and-forecast capability.
///
/// Implementations must be safe to call from several worker threads at once.
/// Failures are reported as `ForecastError::EngineInvocation`.
pub trait ModelEngine: Send + Sync {
    fn fit_and_forecast(&self, call: &EngineCall) -> Result<RawEngineReply>;

    /// Short backend name for logs.
    fn name(&self) -> &str {
        "engine"
    }
}

impl<E: ModelEngine + ?Sized> ModelEngine for Arc<E> {
    fn fit_and_forecast(&self, call: &EngineCall) -> Result<RawEngineReply> {
        (**self).fit_and_forecast(call)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<E: ModelEngine + ?Sized> ModelEngine for Box<E> {
    fn fit_and_forecast(&self, call: &EngineCall) -> Result<RawEngineReply> {
        (**self).fit_and_forecast(call)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
