//! Global tracing subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::error::SettingsError;
use crate::settings::{LogFormat, LoggingSettings};

/// Builds the env filter: `RUST_LOG` wins, otherwise the configured level.
pub fn build_filter(settings: &LoggingSettings) -> Result<EnvFilter, SettingsError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.level)
            .map_err(|e| SettingsError::Logging(format!("invalid level '{}': {}", settings.level, e))),
    }
}

/// Installs the global subscriber and routes `log` records into it.
///
/// Fails if a global subscriber or logger is already installed.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), SettingsError> {
    let filter = build_filter(settings)?;

    let output = match settings.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true)
            .boxed(),
    };

    let subscriber = Registry::default().with(filter).with(output);

    tracing_log::LogTracer::init().map_err(|e| SettingsError::Logging(e.to_string()))?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| SettingsError::Logging(e.to_string()))?;

    Ok(())
}
