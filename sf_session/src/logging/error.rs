use snafu::{Location, Snafu};
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LogError {
    #[snafu(display("Failed to create log file {}", path.display()))]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to build OpenTelemetry exporter"))]
    Exporter {
        source: opentelemetry_otlp::ExporterBuildError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Global tracing subscriber already installed"))]
    Subscriber {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },
}
