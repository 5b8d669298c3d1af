//! Boot — config load and logging init.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::{ConfigError, ConverterConfig, LogFormat};

/// Initialise the tracing / logging subsystem.
///
/// `RUST_LOG` wins over the configured filter.
pub fn init_logging(config: &ConverterConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter.as_str().into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Load and validate config, then bring up logging.
pub fn boot() -> Result<ConverterConfig, ConfigError> {
    let config = ConverterConfig::load()?;
    init_logging(&config);

    info!("Starting converter v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Loaded configuration: table={}, busy_timeout={}ms",
        config.table, config.busy_timeout_ms
    );
    Ok(config)
}
