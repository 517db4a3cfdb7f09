//! Logging setup for the `slt` binary
//!
//! Logs go to stderr so the report on stdout stays clean. `RUST_LOG` takes
//! precedence over the level derived from `-v`.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level filter
    pub default_filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,
}

impl LoggingConfig {
    /// `-v` count to filter: warn, info, debug, then trace
    pub fn for_verbosity(verbosity: u8, json: bool) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            default_filter: level.to_string(),
            json,
            include_location: verbosity >= 3,
        }
    }
}

/// Install the global subscriber
pub fn init(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let layer = if config.json {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .compact()
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    tracing::debug!(
        filter = %config.default_filter,
        json = config.json,
        "logging initialized"
    );
    Ok(())
}
