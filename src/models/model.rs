//! Model identifier classification.
//!
//! Engines run two kinds of model:
//! - direct-forecast procedures, where one call fits and forecasts
//!   (`thetaf`, `splinef`, `rwf(drift = TRUE)`, `naive`, `snaive`)
//! - fit-then-forecast specifications, where the identifier is an expression
//!   over the series variable that yields a fitted model, forecast in a
//!   second step (`ets(rdata)`, `auto.arima(rdata, d = 1)`)
//!
//! The naming convention is: a function name ending in `f`, or one of the
//! two named baselines, is direct. Everything else is fit-then-forecast.

use serde::{Deserialize, Serialize};

/// Variable name the engine binds the series to.
pub const SERIES_VAR: &str = "rdata";

/// Direct procedures whose names do not follow the `...f` convention.
const DIRECT_BASELINES: [&str; 2] = ["naive", "snaive"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelCall {
    /// `function(series, h, level, args...)`.
    DirectForecast {
        function: String,
        args: Option<String>,
    },
    /// `forecast(<spec>, h, level)`.
    FitThenForecast { spec: String },
}

impl ModelCall {
    pub fn family_name(&self) -> &'static str {
        match self {
            ModelCall::DirectForecast { .. } => "direct",
            ModelCall::FitThenForecast { .. } => "fit_then_forecast",
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, ModelCall::DirectForecast { .. })
    }
}

/// Classify a model identifier into its call family.
///
/// A bare fit-then-forecast name (`ets`) is applied to the series variable
/// (`ets(rdata)`). For direct procedures a leading series argument is dropped
/// since the engine always passes the series first.
pub fn classify(identifier: &str) -> ModelCall {
    let identifier = identifier.trim();
    let (name, args) = split_call(identifier);

    if name.ends_with('f') || DIRECT_BASELINES.contains(&name) {
        return ModelCall::DirectForecast {
            function: name.to_string(),
            args: args.and_then(strip_series_arg),
        };
    }

    if args.is_none() && is_bare_name(name) {
        return ModelCall::FitThenForecast {
            spec: format!("{name}({SERIES_VAR})"),
        };
    }

    ModelCall::FitThenForecast {
        spec: identifier.to_string(),
    }
}

/// Split `name(args)` into `("name", Some("args"))`.
fn split_call(identifier: &str) -> (&str, Option<&str>) {
    let Some(open) = identifier.find('(') else {
        return (identifier, None);
    };
    let name = identifier[..open].trim();
    let rest = &identifier[open + 1..];
    let inner = rest.strip_suffix(')').unwrap_or(rest).trim();
    if inner.is_empty() {
        (name, None)
    } else {
        (name, Some(inner))
    }
}

fn strip_series_arg(args: &str) -> Option<String> {
    let rest = match args.strip_prefix(SERIES_VAR) {
        Some(rest) if rest.trim().is_empty() => return None,
        Some(rest) if rest.trim_start().starts_with(',') => rest.trim_start()[1..].trim(),
        _ => args,
    };
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn is_bare_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(function: &str, args: Option<&str>) -> ModelCall {
        ModelCall::DirectForecast {
            function: function.to_string(),
            args: args.map(str::to_string),
        }
    }

    fn fit(spec: &str) -> ModelCall {
        ModelCall::FitThenForecast {
            spec: spec.to_string(),
        }
    }

    #[test]
    fn suffix_f_is_direct() {
        assert_eq!(classify("thetaf"), direct("thetaf", None));
        assert_eq!(classify("splinef()"), direct("splinef", None));
        assert_eq!(classify("rwf(drift = TRUE)"), direct("rwf", Some("drift = TRUE")));
    }

    #[test]
    fn named_baselines_are_direct() {
        assert_eq!(classify("naive"), direct("naive", None));
        assert_eq!(classify(" snaive "), direct("snaive", None));
    }

    #[test]
    fn leading_series_argument_is_dropped_for_direct() {
        assert_eq!(classify("meanf(rdata)"), direct("meanf", None));
        assert_eq!(classify("rwf(rdata, drift = TRUE)"), direct("rwf", Some("drift = TRUE")));
    }

    #[test]
    fn everything_else_fits_then_forecasts() {
        assert_eq!(classify("ets(rdata)"), fit("ets(rdata)"));
        assert_eq!(
            classify("auto.arima(rdata, d = 1)"),
            fit("auto.arima(rdata, d = 1)")
        );
        assert!(!classify("tbats(rdata)").is_direct());
    }

    #[test]
    fn bare_fit_name_is_applied_to_series() {
        assert_eq!(classify("ets"), fit("ets(rdata)"));
        assert_eq!(classify("auto.arima"), fit("auto.arima(rdata)"));
    }
}
