//! Crate-wide error type.
//!
//! Every failure carries enough context to find its origin: the frequency code,
//! the model identifier, the reconstructed field, or (in batch mode) the column.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    /// Frequency code outside the supported enumeration.
    #[error("Unsupported frequency code {0} (expected one of 1, 4, 12, 365, 8760).")]
    UnsupportedFrequency(u32),

    /// The external engine rejected the model, failed during fitting, or
    /// returned an incomplete reply.
    #[error("Engine call for model '{model}' failed: {message}")]
    EngineInvocation { model: String, message: String },

    /// Engine output is inconsistent with the trimmed input.
    #[error("Cannot reconstruct '{field}': {message}")]
    Reconstruction { field: &'static str, message: String },

    /// Zero or several result views were selected.
    #[error("Invalid view selection: {0}")]
    InvalidViewSelection(String),

    /// Input is not a well-formed series or table.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request parameters out of range.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failure of a single column in a batch.
    #[error("Column '{column}': {source}")]
    Column {
        column: String,
        #[source]
        source: Box<ForecastError>,
    },

    /// The batch join deadline passed before these columns completed.
    #[error("Timed out waiting for columns: {}", pending.join(", "))]
    Timeout { pending: Vec<String> },

    /// The batch was cancelled; no results are returned.
    #[error("Batch cancelled with {} column(s) outstanding.", pending.len())]
    Cancelled { pending: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForecastError {
    pub fn engine(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineInvocation {
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn reconstruction(field: &'static str, message: impl Into<String>) -> Self {
        Self::Reconstruction {
            field,
            message: message.into(),
        }
    }

    /// Attribute this error to a batch column.
    pub fn in_column(self, column: impl Into<String>) -> Self {
        Self::Column {
            column: column.into(),
            source: Box::new(self),
        }
    }

    /// Column name when the error is attributed to one.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Column { column, .. } => Some(column),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_attribution_keeps_source() {
        let err = ForecastError::engine("ets(rdata)", "boom").in_column("sales");
        assert_eq!(err.column(), Some("sales"));
        let msg = err.to_string();
        assert!(msg.contains("sales"));
        assert!(msg.contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn timeout_lists_pending_columns() {
        let err = ForecastError::Timeout {
            pending: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Timed out waiting for columns: a, b");
    }
}
