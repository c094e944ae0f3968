//! Logging subsystem setup.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use super::config::LoggingConfig;
use super::error::{Error, Result};

/// Map a configured level name to a tracing level, defaulting to INFO.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize the logging subsystem.
///
/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG` plus the
/// configured level. Fails if the host already installed a global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(parse_level(&config.level).into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    let result = if config.with_timestamps {
        builder.try_init()
    } else {
        builder.without_time().try_init()
    };

    result.map_err(|e| Error::config(format!("logging setup failed: {e}")))
}
