//! Logging setup for the `dbverify` binary
//!
//! Events go to stderr so that report output on stdout stays machine
//! readable. `RUST_LOG` takes precedence over the configured filter.

use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human readable, colored when stderr is a terminal
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,

    /// Default filter directive, e.g. `warn` or `dbverify_checks=debug`
    pub default_filter: String,

    /// Whether to include file/line information in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_filter: "warn".to_string(),
            include_location: cfg!(debug_assertions),
        }
    }
}

impl LoggingConfig {
    pub fn new(level: &str, format: LogFormat) -> Self {
        Self {
            format,
            default_filter: level.to_string(),
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
            .compact()
            .with_filter(config.env_filter())
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_current_span(true)
            .with_filter(config.env_filter())
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    tracing::debug!(filter = %config.default_filter, format = ?config.format, "logging initialized");
    Ok(())
}
