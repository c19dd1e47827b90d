//! Engine request and reply shapes.
//!
//! Replies arrive as JSON with nine named fields. Numeric fields may be a
//! scalar, a flat array or a row-major nested array (matrix); missing values
//! are `null` and become `NaN`.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::{ForecastRequest, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{ModelCall, classify};

/// Field names every engine reply must carry.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "model",
    "method",
    "mean",
    "lower",
    "upper",
    "level",
    "x",
    "residuals",
    "fitted",
];

/// One fit/forecast request as sent to an engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineCall {
    /// Identifier as supplied by the caller (for messages).
    pub identifier: String,
    pub model: ModelCall,
    /// Trimmed series values (`NaN` for interior gaps).
    pub values: Vec<f64>,
    /// Periods per seasonal cycle.
    pub frequency: u32,
    pub horizon: usize,
    pub levels: Vec<f64>,
}

impl EngineCall {
    pub fn new(request: &ForecastRequest, trimmed: &TimeSeries) -> Self {
        Self {
            identifier: request.model().to_string(),
            model: classify(request.model()),
            values: trimmed.values().to_vec(),
            frequency: request.frequency(),
            horizon: request.horizon(),
            levels: vec![request.confidence_level()],
        }
    }
}

/// A numeric reply field in any of the shapes engines produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineArray {
    Scalar(Option<f64>),
    Flat(Vec<Option<f64>>),
    Nested(Vec<Vec<Option<f64>>>),
}

impl EngineArray {
    pub fn flat(values: Vec<f64>) -> Self {
        EngineArray::Flat(values.into_iter().map(Some).collect())
    }

    /// As a matrix: scalars are 1x1, flat arrays a single column, nested
    /// arrays one row per inner array.
    pub fn to_matrix(&self, field: &'static str) -> Result<DMatrix<f64>> {
        match self {
            EngineArray::Scalar(v) => Ok(DMatrix::from_element(1, 1, v.unwrap_or(f64::NAN))),
            EngineArray::Flat(values) => Ok(DMatrix::from_iterator(
                values.len(),
                1,
                values.iter().map(|v| v.unwrap_or(f64::NAN)),
            )),
            EngineArray::Nested(rows) => {
                let ncols = rows.first().map_or(0, Vec::len);
                if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
                    return Err(ForecastError::reconstruction(
                        field,
                        format!(
                            "ragged array: row {bad} has {} columns, expected {ncols}",
                            rows[bad].len()
                        ),
                    ));
                }
                Ok(DMatrix::from_row_iterator(
                    rows.len(),
                    ncols,
                    rows.iter().flatten().map(|v| v.unwrap_or(f64::NAN)),
                ))
            }
        }
    }

    /// Row-major flattening to one dimension.
    pub fn flatten(&self, field: &'static str) -> Result<Vec<f64>> {
        match self {
            EngineArray::Scalar(v) => Ok(vec![v.unwrap_or(f64::NAN)]),
            EngineArray::Flat(values) => Ok(values.iter().map(|v| v.unwrap_or(f64::NAN)).collect()),
            EngineArray::Nested(_) => {
                let m = self.to_matrix(field)?;
                Ok(m.transpose().as_slice().to_vec())
            }
        }
    }
}

/// Method name, reported either as a string or a one-element string array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    One(String),
    Many(Vec<String>),
}

impl TextField {
    pub fn into_string(self) -> String {
        match self {
            TextField::One(s) => s,
            TextField::Many(parts) => parts.join(" "),
        }
    }
}

/// Engine reply as received; any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEngineReply {
    #[serde(default)]
    pub model: Option<serde_json::Value>,
    #[serde(default)]
    pub method: Option<TextField>,
    #[serde(default)]
    pub mean: Option<EngineArray>,
    #[serde(default)]
    pub lower: Option<EngineArray>,
    #[serde(default)]
    pub upper: Option<EngineArray>,
    #[serde(default)]
    pub level: Option<EngineArray>,
    #[serde(default)]
    pub x: Option<EngineArray>,
    #[serde(default)]
    pub residuals: Option<EngineArray>,
    #[serde(default)]
    pub fitted: Option<EngineArray>,
}

impl RawEngineReply {
    /// Names of required fields absent from this reply.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.model.is_some(),
            self.method.is_some(),
            self.mean.is_some(),
            self.lower.is_some(),
            self.upper.is_some(),
            self.level.is_some(),
            self.x.is_some(),
            self.residuals.is_some(),
            self.fitted.is_some(),
        ];
        REQUIRED_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Require all nine fields.
    pub fn into_output(self, identifier: &str) -> Result<RawEngineOutput> {
        let missing = self.missing_fields();
        let (
            Some(model),
            Some(method),
            Some(mean),
            Some(lower),
            Some(upper),
            Some(level),
            Some(x),
            Some(residuals),
            Some(fitted),
        ) = (
            self.model,
            self.method,
            self.mean,
            self.lower,
            self.upper,
            self.level,
            self.x,
            self.residuals,
            self.fitted,
        )
        else {
            return Err(ForecastError::engine(
                identifier,
                format!("reply is missing field(s): {}", missing.join(", ")),
            ));
        };

        Ok(RawEngineOutput {
            model,
            method: method.into_string(),
            mean,
            lower,
            upper,
            level,
            x,
            residuals,
            fitted,
        })
    }
}

/// A complete engine reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEngineOutput {
    pub model: serde_json::Value,
    pub method: String,
    pub mean: EngineArray,
    pub lower: EngineArray,
    pub upper: EngineArray,
    pub level: EngineArray,
    pub x: EngineArray,
    pub residuals: EngineArray,
    pub fitted: EngineArray,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_jsonlite_style_reply() {
        let json = r#"{
            "model": "ETS(A,N,N)",
            "method": ["ETS(A,N,N)"],
            "mean": [1.5, 2.5],
            "lower": [[1.0], [2.0]],
            "upper": [[2.0], [3.0]],
            "level": [80],
            "x": [1, 2, 3],
            "residuals": [null, 0.1, -0.1],
            "fitted": [null, 1.9, 3.1]
        }"#;
        let reply: RawEngineReply = serde_json::from_str(json).unwrap();
        assert!(reply.missing_fields().is_empty());
        let out = reply.into_output("ets").unwrap();
        assert_eq!(out.method, "ETS(A,N,N)");
        assert_eq!(out.lower.flatten("lower").unwrap(), vec![1.0, 2.0]);
        let fitted = out.fitted.flatten("fitted").unwrap();
        assert!(fitted[0].is_nan());
        assert_eq!(&fitted[1..], &[1.9, 3.1]);
    }

    #[test]
    fn missing_fields_are_named() {
        let json = r#"{"model": "m", "method": "naive", "mean": [1.0], "level": 80}"#;
        let reply: RawEngineReply = serde_json::from_str(json).unwrap();
        let err = reply.into_output("naive").unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ForecastError::EngineInvocation { .. }));
        for field in ["lower", "upper", "x", "residuals", "fitted"] {
            assert!(msg.contains(field), "{msg}");
        }
        assert!(!msg.contains("mean"));
    }

    #[test]
    fn nested_and_flat_flatten_identically() {
        let flat = EngineArray::flat(vec![1.0, 2.0, 3.0]);
        let column = EngineArray::Nested(vec![vec![Some(1.0)], vec![Some(2.0)], vec![Some(3.0)]]);
        let row = EngineArray::Nested(vec![vec![Some(1.0), Some(2.0), Some(3.0)]]);
        let expected = flat.flatten("mean").unwrap();
        assert_eq!(column.flatten("mean").unwrap(), expected);
        assert_eq!(row.flatten("mean").unwrap(), expected);
    }

    #[test]
    fn matrix_flattens_row_major() {
        // Two forecast steps, two levels per step.
        let m = EngineArray::Nested(vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0), Some(4.0)]]);
        assert_eq!(m.to_matrix("lower").unwrap().shape(), (2, 2));
        assert_eq!(m.flatten("lower").unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let m = EngineArray::Nested(vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0)]]);
        assert!(matches!(
            m.flatten("upper"),
            Err(ForecastError::Reconstruction { field: "upper", .. })
        ));
    }

    #[test]
    fn call_carries_single_level_and_class() {
        let req = ForecastRequest::new("thetaf", 3, 4).unwrap();
        let series = TimeSeries::default();
        let call = EngineCall::new(&req, &series);
        assert_eq!(call.levels, vec![80.0]);
        assert!(call.model.is_direct());
        assert_eq!(call.frequency, 4);
    }
}
