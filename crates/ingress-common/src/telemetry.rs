//! Tracing subscriber initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a text
//! or JSON fmt layer. Logs go to stderr so command output on stdout stays
//! machine-readable.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::DEFAULT_LOG_FILTER;

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Log line format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Output format
    pub format: LogFormat,
    /// Filter directives used when `RUST_LOG` is unset
    pub default_filter: Option<String>,
}

impl TelemetryConfig {
    fn env_filter(&self) -> EnvFilter {
        let default = self.default_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }
}

/// Initialize the global tracing subscriber
pub fn init_tracing(config: TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = config.env_filter();

    // Option<Layer> implements Layer, so only one of these is active
    let (json_layer, text_layer) = match config.format {
        LogFormat::Json => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Text => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::SubscriberInit(e.to_string())
        })
}
