use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::TimeSeries;

/// Column-aligned batch output: one shared date index, one value column per
/// input column (in input order), `NaN` where a column has no value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForecastTable {
    index: Vec<NaiveDateTime>,
    columns: Vec<(String, Vec<f64>)>,
}

impl ForecastTable {
    /// Outer join on the date index. A `None` column is kept as all-missing.
    pub fn outer_join<'a>(columns: impl IntoIterator<Item = (String, Option<&'a TimeSeries>)>) -> Self {
        let columns: Vec<(String, Option<&TimeSeries>)> = columns.into_iter().collect();

        let index: Vec<NaiveDateTime> = columns
            .iter()
            .filter_map(|(_, s)| *s)
            .flat_map(|s| s.index().iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = columns
            .into_iter()
            .map(|(name, series)| {
                let mut values = vec![f64::NAN; index.len()];
                for (t, v) in series.into_iter().flat_map(|s| s.iter()) {
                    if let Ok(row) = index.binary_search(&t) {
                        values[row] = v;
                    }
                }
                (name, values)
            })
            .collect();

        Self { index, columns }
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn value(&self, name: &str, t: NaiveDateTime) -> Option<f64> {
        let row = self.index.binary_search(&t).ok()?;
        self.column(name).map(|v| v[row])
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }
}
