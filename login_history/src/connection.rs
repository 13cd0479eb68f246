use crate::parameters::{ConfigError, ConnectionParameters};
use crate::warehouse::SessionBuilder;
use snafu::{Location, ResultExt, Snafu};
use std::path::Path;

#[derive(Debug, Snafu)]
pub enum BuildError<E>
where
    E: std::error::Error + 'static,
{
    #[snafu(display("Failed to load connection parameters: {source}"))]
    Parameters {
        source: ConfigError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to create session: {source}"))]
    Session {
        source: E,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Opens a session with `parameters` exactly as given.
///
/// Errors from the builder are returned untouched.
#[tracing::instrument(skip_all, fields(account = %parameters.account, user = %parameters.user))]
pub fn build_connection<B>(
    builder: &B,
    parameters: ConnectionParameters,
) -> Result<B::Session, B::Error>
where
    B: SessionBuilder,
{
    tracing::info!("Creating warehouse session");
    builder.create(parameters)
}

/// Reads the parameters from `section` of the INI file at `path`, then opens a session.
///
/// The builder is not invoked unless all parameters were read.
pub fn build_connection_from_file<B>(
    builder: &B,
    path: impl AsRef<Path>,
    section: &str,
) -> Result<B::Session, BuildError<B::Error>>
where
    B: SessionBuilder,
{
    let parameters: Result<_, BuildError<B::Error>> =
        ConnectionParameters::from_ini_file(path, section).context(ParametersSnafu);
    build_connection(builder, parameters?).context(SessionSnafu)
}
