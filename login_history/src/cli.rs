use crate::connection::{BuildError, build_connection_from_file};
use crate::parameters::{DEFAULT_CONFIG_PATH, DEFAULT_SECTION};
use crate::refresh::{RefreshStatus, refresh_login_history};
use crate::warehouse::{RestSessionBuilder, WarehouseError};
use clap::{Arg, ArgAction, ArgMatches, Command};
use sf_session::SessionError;
use sf_session::logging::LoggingConfig;
use snafu::{Location, ResultExt, Snafu};
use std::path::PathBuf;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("{source}"))]
    Connect {
        source: BuildError<WarehouseError>,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Login history refresh failed: {source}"))]
    Refresh {
        source: WarehouseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to close session: {source}"))]
    Close {
        source: SessionError,
        #[snafu(implicit)]
        location: Location,
    },
}

pub fn command() -> Command {
    Command::new("refresh_login_history")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Copies SNOWFLAKE.ACCOUNT_USAGE.LOGIN_HISTORY into the loginhistory table")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to the INI file holding the connection parameters")
                .value_name("FILE")
                .default_value(DEFAULT_CONFIG_PATH)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("section")
                .long("section")
                .help("INI section to read the parameters from")
                .value_name("NAME")
                .default_value(DEFAULT_SECTION),
        )
        .arg(
            Arg::new("skip")
                .long("skip")
                .help("Connect but leave the loginhistory table untouched")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("server-url")
                .long("server-url")
                .help("Override the account endpoint (e.g. a local proxy)")
                .value_name("URL"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write debug logs to this file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log to stderr (filter with RUST_LOG)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("otel")
                .long("otel")
                .help("Export traces over OTLP/HTTP")
                .action(ArgAction::SetTrue),
        )
}

pub fn logging_config(matches: &ArgMatches) -> LoggingConfig {
    LoggingConfig::new(
        matches.get_one::<PathBuf>("log-file").cloned(),
        matches.get_flag("verbose"),
        matches.get_flag("otel"),
    )
}

/// Connects with the configured parameters, refreshes unless `--skip` was
/// given, and closes the session before reporting the status.
pub fn run(matches: &ArgMatches) -> Result<RefreshStatus, CliError> {
    let mut builder = RestSessionBuilder::new();
    if let Some(server_url) = matches.get_one::<String>("server-url") {
        builder = builder.with_server_url(server_url);
    }

    let config = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let section = matches
        .get_one::<String>("section")
        .map(String::as_str)
        .unwrap_or(DEFAULT_SECTION);

    let session = build_connection_from_file(&builder, &config, section).context(ConnectSnafu)?;
    let status = refresh_login_history(&session, !matches.get_flag("skip")).context(RefreshSnafu)?;
    session.close().context(CloseSnafu)?;
    Ok(status)
}
