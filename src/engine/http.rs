//! Remote modeling service backend.
//!
//! Each call is a JSON `POST` of the `EngineCall`; the service answers with the
//! nine reply fields as a JSON object.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::engine::{EngineCall, ModelEngine, RawEngineReply};
use crate::error::{ForecastError, Result};

pub struct HttpEngine {
    client: Client,
    url: String,
}

impl HttpEngine {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ForecastError::Config("Engine URL is empty.".to_string()));
        }
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ForecastError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, url })
    }

    /// Read `FORECAST_ENGINE_URL` (required) and `FORECAST_ENGINE_TIMEOUT_SECS`
    /// (optional) from the environment or `.env`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let url = std::env::var("FORECAST_ENGINE_URL").map_err(|_| {
            ForecastError::Config("Missing FORECAST_ENGINE_URL in environment (.env).".to_string())
        })?;
        let timeout = match std::env::var("FORECAST_ENGINE_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| {
                    ForecastError::Config(format!("Invalid FORECAST_ENGINE_TIMEOUT_SECS '{raw}': {e}"))
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };
        Self::new(url, timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ModelEngine for HttpEngine {
    fn fit_and_forecast(&self, call: &EngineCall) -> Result<RawEngineReply> {
        let resp = self
            .client
            .post(&self.url)
            .json(call)
            .send()
            .map_err(|e| ForecastError::engine(&call.identifier, format!("Engine request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ForecastError::engine(
                &call.identifier,
                format!("Engine request failed with status {status}: {}", body.trim()),
            ));
        }

        resp.json().map_err(|e| {
            ForecastError::engine(&call.identifier, format!("Failed to parse engine reply: {e}"))
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_rejected() {
        assert!(matches!(
            HttpEngine::new("  ", None),
            Err(ForecastError::Config(_))
        ));
    }

    #[test]
    fn keeps_configured_url() {
        let engine = HttpEngine::new("http://127.0.0.1:9/forecast", Some(Duration::from_secs(1))).unwrap();
        assert_eq!(engine.url(), "http://127.0.0.1:9/forecast");
        assert_eq!(engine.name(), "http");
    }
}
