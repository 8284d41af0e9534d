//! Logging setup for programs embedding the typing layer
//!
//! The library itself only emits `tracing` events (declarations and new
//! specializations at `debug`, cache hits and subtype decisions at `trace`).
//! Nothing is printed unless a subscriber is installed, which [`init`] does:
//! - stderr output, optionally alongside a daily rotating log file
//! - text or JSON formatting
//! - filtering from the configured directive, `RUST_LOG`, or `info`

use crate::errors::ConfigError;
use serde::Deserialize;
use std::{io, path::PathBuf};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON-structured output for machine parsing
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Directory for a daily rotating log file; no file output when `None`
    pub log_dir: Option<PathBuf>,
    pub log_filename: String,
    pub stderr: bool,
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            log_dir: None,
            log_filename: "pipetype.log".to_string(),
            stderr: true,
            env_filter: None,
        }
    }
}

impl LogConfig {
    /// Create a new logging configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Write to a daily rotating file in this directory
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Set the log filename
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.log_filename = filename.into();
        self
    }

    /// Enable or disable stderr output
    pub fn with_stderr(mut self, stderr: bool) -> Self {
        self.stderr = stderr;
        self
    }

    /// Set the filter directive, overriding `RUST_LOG`
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Full path of the log file, if file output is enabled
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_dir.as_ref().map(|dir| dir.join(&self.log_filename))
    }

    fn filter(&self) -> Result<EnvFilter, ConfigError> {
        match &self.env_filter {
            Some(filter) => EnvFilter::try_new(filter).map_err(|e| ConfigError::LogFilter(e.to_string())),
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
        }
    }
}

fn format_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(ansi).with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).with_target(true).boxed(),
    }
}

/// Install a global subscriber for the given configuration
///
/// Fails if the filter directive is invalid, the log directory cannot be created,
/// or a global subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = config.filter()?;

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, &config.log_filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            // The guard flushes on drop; the subscriber lives for the whole process.
            std::mem::forget(guard);
            Some(format_layer(config.format, non_blocking, false))
        }
        None => None,
    };
    let stderr_layer = config.stderr.then(|| format_layer(config.format, io::stderr, true));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;
    Ok(())
}
