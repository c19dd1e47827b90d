//! Wide CSV ingest.
//!
//! Layout: the first column holds dates, every further column is one series.
//! Blank cells (and `NA` / `NaN`) are missing observations. Rows may appear in
//! any order; they are sorted by date and duplicate dates are rejected.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{SeriesTable, TimeSeries};
use crate::error::{ForecastError, Result};

/// Load a wide CSV file into a `SeriesTable`.
pub fn read_table_csv(path: &Path) -> Result<SeriesTable> {
    let file = File::open(path).map_err(|e| {
        ForecastError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open CSV '{}': {e}", path.display()),
        ))
    })?;
    read_table(file)
}

pub fn read_table<R: Read>(source: R) -> Result<SeriesTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let names: Vec<String> = headers
        .iter()
        .skip(1)
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if names.is_empty() {
        return Err(ForecastError::InvalidInput(
            "CSV needs a date column and at least one series column.".to_string(),
        ));
    }

    let mut rows: Vec<(NaiveDateTime, Vec<f64>)> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // records() starts after the header; lines are 1-based.
        let line = idx + 2;
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let date = parse_datetime(record.get(0).unwrap_or_default())
            .map_err(|e| ForecastError::InvalidInput(format!("line {line}: {e}")))?;

        let mut values = Vec::with_capacity(names.len());
        for (col, name) in names.iter().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default();
            let v = parse_cell(cell).ok_or_else(|| {
                ForecastError::InvalidInput(format!(
                    "line {line}, column '{name}': '{cell}' is not a number"
                ))
            })?;
            values.push(v);
        }
        rows.push((date, values));
    }

    rows.sort_by_key(|(date, _)| *date);
    if let Some(w) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(ForecastError::InvalidInput(format!("Duplicate date {}.", w[0].0)));
    }

    let index: Vec<NaiveDateTime> = rows.iter().map(|(d, _)| *d).collect();
    let mut table = SeriesTable::default();
    for (col, name) in names.into_iter().enumerate() {
        let values = rows.iter().map(|(_, v)| v[col]).collect();
        table.push(name, TimeSeries::new(index.clone(), values)?)?;
    }
    Ok(table)
}

fn parse_datetime(s: &str) -> std::result::Result<NaiveDateTime, String> {
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in DATETIME_FMTS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| {
            format!("Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, YYYY-MM-DDTHH:MM:SS.")
        })
}

/// `None` for text that is neither a number nor a missing marker.
fn parse_cell(s: &str) -> Option<f64> {
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    s.parse::<f64>().ok()
}
