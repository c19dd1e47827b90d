//! Shared domain types.
//!
//! This module defines:
//!
//! - date-indexed sequences (`TimeSeries`) and named collections of them (`SeriesTable`)
//! - the per-call request (`ForecastRequest`)
//! - the reconstructed output (`ForecastResult`) and the batch view selection

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Confidence level used when a request does not specify one.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 80.0;

/// A date-indexed numeric sequence.
///
/// The index is strictly increasing. Missing observations are `NaN`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeSeries {
    index: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(index: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(ForecastError::InvalidInput(format!(
                "Index length ({}) does not match values length ({}).",
                index.len(),
                values.len()
            )));
        }
        if let Some(pos) = index.windows(2).position(|w| w[0] >= w[1]) {
            return Err(ForecastError::InvalidInput(format!(
                "Index is not strictly increasing at {} -> {}.",
                index[pos],
                index[pos + 1]
            )));
        }
        Ok(Self { index, values })
    }

    /// Build a series indexed by midnight of each date.
    pub fn from_dates(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        let index = dates.into_iter().map(|d| d.and_time(chrono::NaiveTime::MIN)).collect();
        Self::new(index, values)
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn first_index(&self) -> Option<NaiveDateTime> {
        self.index.first().copied()
    }

    pub fn last_index(&self) -> Option<NaiveDateTime> {
        self.index.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `t`, if `t` is in the index.
    pub fn get(&self, t: NaiveDateTime) -> Option<f64> {
        self.index.binary_search(&t).ok().map(|i| self.values[i])
    }

    /// Number of non-missing observations.
    pub fn observed_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Restrict to the closed range between the first and last non-missing
    /// observation. `None` when every observation is missing.
    pub fn trimmed(&self) -> Option<TimeSeries> {
        let start = self.values.iter().position(|v| !v.is_nan())?;
        let end = self.values.iter().rposition(|v| !v.is_nan())?;
        Some(TimeSeries {
            index: self.index[start..=end].to_vec(),
            values: self.values[start..=end].to_vec(),
        })
    }

    /// `self` followed by `tail`. `None` if the joined index would not be
    /// strictly increasing.
    pub fn concat(&self, tail: &TimeSeries) -> Option<TimeSeries> {
        if let (Some(last), Some(first)) = (self.last_index(), tail.first_index()) {
            if first <= last {
                return None;
            }
        }
        let mut index = Vec::with_capacity(self.len() + tail.len());
        index.extend_from_slice(&self.index);
        index.extend_from_slice(&tail.index);
        let mut values = Vec::with_capacity(self.len() + tail.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&tail.values);
        Some(TimeSeries { index, values })
    }

    /// Bitwise equality (treats identical `NaN` payloads as equal).
    pub fn same_bits(&self, other: &TimeSeries) -> bool {
        self.index == other.index
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// An ordered collection of uniquely named series.
///
/// Columns share no required common index; each is forecast independently.
#[derive(Debug, Clone, Default)]
pub struct SeriesTable {
    columns: Vec<(String, TimeSeries)>,
}

impl SeriesTable {
    pub fn new(columns: Vec<(String, TimeSeries)>) -> Result<Self> {
        let mut table = Self::default();
        for (name, series) in columns {
            table.push(name, series)?;
        }
        Ok(table)
    }

    pub fn push(&mut self, name: impl Into<String>, series: TimeSeries) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ForecastError::InvalidInput(format!(
                "Duplicate column name '{name}'."
            )));
        }
        self.columns.push((name, series));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TimeSeries> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TimeSeries)> {
        self.columns.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Parameters shared by every series in one forecasting call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRequest {
    model: String,
    horizon: usize,
    frequency: u32,
    confidence_level: f64,
}

impl ForecastRequest {
    /// Build a request with the default confidence level.
    ///
    /// `frequency` is a periods-per-year code; it is resolved when the request
    /// is executed.
    pub fn new(model: impl Into<String>, horizon: usize, frequency: u32) -> Result<Self> {
        let model = model.into().trim().to_string();
        if model.is_empty() {
            return Err(ForecastError::InvalidRequest(
                "Model identifier is empty.".to_string(),
            ));
        }
        if horizon == 0 {
            return Err(ForecastError::InvalidRequest(
                "Horizon must be at least one period.".to_string(),
            ));
        }
        Ok(Self {
            model,
            horizon,
            frequency,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        })
    }

    pub fn with_confidence_level(mut self, level: f64) -> Result<Self> {
        if !(level.is_finite() && level > 0.0 && level < 100.0) {
            return Err(ForecastError::InvalidRequest(format!(
                "Confidence level {level} must lie strictly between 0 and 100."
            )));
        }
        self.confidence_level = level;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }
}

/// Reconstructed output of one series forecast.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    /// Engine description of the fitted model.
    pub model: serde_json::Value,
    pub method: String,
    pub predicted: TimeSeries,
    /// Lower prediction bounds, one per forecast step (not date-indexed).
    pub lower: Vec<f64>,
    /// Upper prediction bounds, one per forecast step (not date-indexed).
    pub upper: Vec<f64>,
    pub level: u32,
    /// The trimmed input series.
    pub x: TimeSeries,
    pub residuals: TimeSeries,
    pub fitted: TimeSeries,
    /// `fitted` followed by `predicted`.
    pub full_fit: TimeSeries,
    /// `x` followed by `predicted`.
    pub full_actuals: TimeSeries,
}

impl ForecastResult {
    pub fn view(&self, view: View) -> &TimeSeries {
        match view {
            View::FitPred => &self.full_fit,
            View::ActualPred => &self.full_actuals,
            View::Pred => &self.predicted,
            View::Fit => &self.fitted,
            View::Residuals => &self.residuals,
        }
    }
}

/// Which `ForecastResult` sequence a batch extracts from every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    FitPred,
    ActualPred,
    Pred,
    Fit,
    Residuals,
}

impl View {
    pub const ALL: [View; 5] = [
        View::FitPred,
        View::ActualPred,
        View::Pred,
        View::Fit,
        View::Residuals,
    ];

    pub fn name(self) -> &'static str {
        match self {
            View::FitPred => "fit_pred",
            View::ActualPred => "actual_pred",
            View::Pred => "pred",
            View::Fit => "fit",
            View::Residuals => "residuals",
        }
    }

    /// Name of the `ForecastResult` field this view selects.
    pub fn field(self) -> &'static str {
        match self {
            View::FitPred => "full_fit",
            View::ActualPred => "full_actuals",
            View::Pred => "predicted",
            View::Fit => "fitted",
            View::Residuals => "residuals",
        }
    }
}

impl FromStr for View {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        View::ALL
            .into_iter()
            .find(|v| v.name() == s.trim())
            .ok_or_else(|| ForecastError::InvalidViewSelection(format!("Unknown view '{s}'.")))
    }
}

/// Flag-style view selection; exactly one flag must be set.
///
/// The default selects `fit_pred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSelection {
    pub fit_pred: bool,
    pub actual_pred: bool,
    pub pred: bool,
    pub fit: bool,
    pub residuals: bool,
}

impl Default for ViewSelection {
    fn default() -> Self {
        Self::from(View::FitPred)
    }
}

impl ViewSelection {
    /// A selection with no flag set.
    pub fn none() -> Self {
        Self {
            fit_pred: false,
            actual_pred: false,
            pred: false,
            fit: false,
            residuals: false,
        }
    }

    pub fn resolve(&self) -> Result<View> {
        let flags = [
            (self.fit_pred, View::FitPred),
            (self.actual_pred, View::ActualPred),
            (self.pred, View::Pred),
            (self.fit, View::Fit),
            (self.residuals, View::Residuals),
        ];
        let active: Vec<View> = flags.iter().filter(|(on, _)| *on).map(|(_, v)| *v).collect();
        match active.as_slice() {
            [view] => Ok(*view),
            [] => Err(ForecastError::InvalidViewSelection(
                "No view selected.".to_string(),
            )),
            many => Err(ForecastError::InvalidViewSelection(format!(
                "Exactly one view must be selected, got {}.",
                many.iter().map(|v| v.name()).collect::<Vec<_>>().join(", ")
            ))),
        }
    }
}

impl From<View> for ViewSelection {
    fn from(view: View) -> Self {
        let mut sel = Self::none();
        match view {
            View::FitPred => sel.fit_pred = true,
            View::ActualPred => sel.actual_pred = true,
            View::Pred => sel.pred = true,
            View::Fit => sel.fit = true,
            View::Residuals => sel.residuals = true,
        }
        sel
    }
}
