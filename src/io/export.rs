//! Export batch tables to CSV and single-series results to JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime};

use crate::batch::ForecastTable;
use crate::domain::ForecastResult;
use crate::error::{ForecastError, Result};

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        ForecastError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create '{}': {e}", path.display()),
        ))
    })?;
    Ok(BufWriter::new(file))
}

/// Write a batch table as wide CSV (missing cells blank).
pub fn write_table_csv(path: &Path, table: &ForecastTable) -> Result<()> {
    write_table(create(path)?, table)
}

pub fn write_table<W: Write>(sink: W, table: &ForecastTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);

    let mut header = vec!["date"];
    header.extend(table.names());
    writer.write_record(&header)?;

    // Date-only output unless some timestamp carries a time of day.
    let fmt = if table.index().iter().all(|t| t.time() == NaiveTime::MIN) {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%d %H:%M:%S"
    };

    let columns: Vec<&[f64]> = table.columns().map(|(_, v)| v).collect();
    for (row, t) in table.index().iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(format_date(*t, fmt));
        record.extend(columns.iter().map(|c| format_cell(c[row])));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write one forecast result as pretty JSON (`NaN` as `null`).
pub fn write_result_json(path: &Path, result: &ForecastResult) -> Result<()> {
    let mut out = create(path)?;
    serde_json::to_writer_pretty(&mut out, result)?;
    out.flush()?;
    Ok(())
}

fn format_date(t: NaiveDateTime, fmt: &str) -> String {
    t.format(fmt).to_string()
}

fn format_cell(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{month, monthly};

    #[test]
    fn missing_cells_are_blank() {
        let a = monthly(month(2020, 1), vec![1.0, 2.5]);
        let b = monthly(month(2020, 2), vec![7.0]);
        let table = ForecastTable::outer_join([("a".to_string(), Some(&a)), ("b".to_string(), Some(&b))]);

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "date,a,b\n2020-01-01,1,\n2020-02-01,2.5,7\n");
    }

    #[test]
    fn hourly_index_keeps_time() {
        let t0 = month(2020, 1);
        let s = crate::domain::TimeSeries::new(vec![t0, t0 + chrono::TimeDelta::hours(1)], vec![1.0, 2.0]).unwrap();
        let table = ForecastTable::outer_join([("x".to_string(), Some(&s))]);
        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("2020-01-01 01:00:00,2"));
    }

    #[test]
    fn result_json_round_trips_through_reader() {
        let dir = std::env::temp_dir().join(format!("forecast-fanout-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("result.json");

        let s = monthly(month(2020, 1), vec![1.0, f64::NAN]);
        let result = ForecastResult {
            model: serde_json::json!("m"),
            method: "Naive method".to_string(),
            predicted: s.clone(),
            lower: vec![0.0],
            upper: vec![2.0],
            level: 80,
            x: s.clone(),
            residuals: s.clone(),
            fitted: s.clone(),
            full_fit: s.clone(),
            full_actuals: s,
        };
        write_result_json(&path, &result).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["level"], 80);
        assert_eq!(value["method"], "Naive method");
        assert!(value["predicted"]["values"][1].is_null());
        std::fs::remove_dir_all(&dir).ok();
    }
}
