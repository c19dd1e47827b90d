//! R `forecast` package backend via an `Rscript` subprocess.
//!
//! Every call renders a self-contained R program, feeds it to a fresh
//! process on stdin and reads one JSON object (written with `jsonlite`) from
//! stdout. Separate processes share no session, so the backend is reentrant.
//! The program carries the series data, so it never goes on the command line.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::engine::{EngineCall, ModelEngine, RawEngineReply};
use crate::error::{ForecastError, Result};
use crate::models::{ModelCall, SERIES_VAR};

const DEFAULT_PROGRAM: &str = "Rscript";

/// How many trailing stderr lines to keep in error messages.
const STDERR_TAIL: usize = 8;

#[derive(Debug, Clone)]
pub struct RscriptEngine {
    program: PathBuf,
}

impl Default for RscriptEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl RscriptEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use `FORECAST_RSCRIPT` (from the environment or `.env`), else `Rscript`
    /// on the `PATH`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        match std::env::var("FORECAST_RSCRIPT") {
            Ok(program) if !program.trim().is_empty() => Self::new(program.trim()),
            _ => Self::default(),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

impl ModelEngine for RscriptEngine {
    fn fit_and_forecast(&self, call: &EngineCall) -> Result<RawEngineReply> {
        let script = render_script(call);

        let mut child = Command::new(&self.program)
            .args(["--vanilla", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ForecastError::engine(
                    &call.identifier,
                    format!("Failed to start '{}': {e}", self.program.display()),
                )
            })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ForecastError::engine(&call.identifier, "R stdin is not available"))?;

        // Feed stdin while draining stdout/stderr so neither pipe can fill up.
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(script.as_bytes()));
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        let output = output.map_err(|e| {
            ForecastError::engine(&call.identifier, format!("Failed to wait for R: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join("\n");
            return Err(ForecastError::engine(
                &call.identifier,
                format!("R exited with {}: {tail}", output.status),
            ));
        }

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(ForecastError::engine(
                    &call.identifier,
                    format!("Failed to send the program to R: {e}"),
                ));
            }
            Err(_) => return Err(ForecastError::engine(&call.identifier, "R stdin writer panicked")),
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| l.starts_with('{'))
            .ok_or_else(|| ForecastError::engine(&call.identifier, "R produced no JSON reply"))?;

        serde_json::from_str(json).map_err(|e| {
            ForecastError::engine(&call.identifier, format!("Invalid JSON reply from R: {e}"))
        })
    }

    fn name(&self) -> &str {
        "rscript"
    }
}

/// Render the R program for one call.
///
/// Direct procedures are applied to the series with `h` and `level`;
/// fit-then-forecast specifications are evaluated first and then passed to
/// `forecast()`.
pub fn render_script(call: &EngineCall) -> String {
    let levels = call
        .levels
        .iter()
        .map(|l| r_number(*l))
        .collect::<Vec<_>>()
        .join(", ");
    let h = call.horizon;

    let mut s = String::new();
    s.push_str("suppressPackageStartupMessages(library(forecast))\n");
    let _ = writeln!(
        s,
        "{SERIES_VAR} <- ts(c({}), frequency = {})",
        call.values.iter().map(|v| r_number(*v)).collect::<Vec<_>>().join(", "),
        call.frequency
    );

    match &call.model {
        ModelCall::DirectForecast { function, args } => {
            let extra = args.as_deref().map(|a| format!(", {a}")).unwrap_or_default();
            let _ = writeln!(
                s,
                "fc <- {function}({SERIES_VAR}, h = {h}, level = c({levels}){extra})"
            );
        }
        ModelCall::FitThenForecast { spec } => {
            let _ = writeln!(s, "fitted_model <- {spec}");
            let _ = writeln!(s, "fc <- forecast(fitted_model, h = {h}, level = c({levels}))");
        }
    }

    // Matrices keep their shape (jsonlite writes them row-major); everything
    // else is sent as a plain numeric vector.
    s.push_str(concat!(
        "shape <- function(v) if (is.null(dim(v))) as.numeric(v) else matrix(as.numeric(v), nrow = nrow(v))\n",
        "out <- list(\n",
        "  model = paste(capture.output(print(fc$model)), collapse = \"\\n\"),\n",
        "  method = fc$method,\n",
        "  mean = shape(fc$mean),\n",
        "  lower = shape(fc$lower),\n",
        "  upper = shape(fc$upper),\n",
        "  level = as.numeric(fc$level),\n",
        "  x = as.numeric(fc$x),\n",
        "  residuals = as.numeric(fc$residuals),\n",
        "  fitted = as.numeric(fc$fitted)\n",
        ")\n",
        "cat(jsonlite::toJSON(out, digits = NA, na = \"null\"), \"\\n\")\n",
    ));
    s
}

fn r_number(v: f64) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Inf".to_string() } else { "-Inf".to_string() }
    } else {
        format!("{v:?}")
    }
}
