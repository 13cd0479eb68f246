use std::path::PathBuf;

pub use crate::logging::error::LogError;
use crate::logging::error::{LogFileSnafu, SubscriberSnafu};
use crate::logging::opentelemetry::init_tracer;
use snafu::ResultExt;
use tracing::level_filters::LevelFilter;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

mod error;
mod opentelemetry;

#[derive(Debug, Default)]
pub struct LoggingConfig {
    pub log_file: Option<PathBuf>,
    pub stderr: bool,
    pub opentelemetry: bool,
}

impl LoggingConfig {
    pub fn new(log_file: Option<PathBuf>, stderr: bool, opentelemetry: bool) -> Self {
        Self {
            log_file,
            stderr,
            opentelemetry,
        }
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(config: LoggingConfig) -> Result<(), LogError> {
    let file_layer = if let Some(log_file) = config.log_file {
        let file = std::fs::File::create(&log_file).context(LogFileSnafu { path: log_file })?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file)
                .with_filter(LevelFilter::DEBUG),
        )
    } else {
        None
    };

    let opentelemetry_layer = if config.opentelemetry {
        Some(OpenTelemetryLayer::new(init_tracer()?))
    } else {
        None
    };

    let stderr_layer = if config.stderr {
        let env_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
    } else {
        None
    };

    let subscriber = Registry::default()
        .with(opentelemetry_layer)
        .with(file_layer)
        .with(stderr_layer);

    tracing::subscriber::set_global_default(subscriber).context(SubscriberSnafu)?;
    Ok(())
}
