use ini::{Ini, ParseOption, Properties};
use snafu::{Location, OptionExt, ResultExt, Snafu};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "assets/credentials.cfg";
pub const DEFAULT_SECTION: &str = "SNOWPARKAWS";
/// Section whose keys every other section inherits.
pub const FALLBACK_SECTION: &str = "DEFAULT";

pub const ACCOUNT_KEY: &str = "SNOWFLAKE_ACCOUNT";
pub const USER_KEY: &str = "SNOWFLAKE_USER";
pub const PASSWORD_KEY: &str = "SNOWFLAKE_PASSWORD";
pub const ROLE_KEY: &str = "SNOWFLAKE_ROLE";
pub const WAREHOUSE_KEY: &str = "SNOWFLAKE_WAREHOUSE";
pub const DATABASE_KEY: &str = "SNOWFLAKE_DATABASE";
pub const SCHEMA_KEY: &str = "SNOWFLAKE_SCHEMA";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("Failed to read configuration file {}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: ini::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to parse configuration"))]
    Parse {
        source: ini::ParseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Configuration section [{section}] not found"))]
    MissingSection {
        section: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Configuration key {key} not found in section [{section}]"))]
    MissingKey {
        section: String,
        key: String,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Credentials and session context for one warehouse connection.
///
/// Every field is required even though role, warehouse, database and schema
/// only narrow the session context: a config without them is rejected.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub account: String,
    pub user: String,
    pub password: String,
    pub role: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"********")
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .finish()
    }
}

// Values are taken verbatim: no quote stripping, no backslash escapes.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    }
}

impl ConnectionParameters {
    pub fn from_ini_file(path: impl AsRef<Path>, section: &str) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), section, "Reading connection parameters");
        let ini = Ini::load_from_file_opt(path, parse_option()).context(ReadFileSnafu { path })?;
        Self::from_ini(&ini, section)
    }

    pub fn from_ini_str(contents: &str, section: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str_opt(contents, parse_option()).context(ParseSnafu)?;
        Self::from_ini(&ini, section)
    }

    fn from_ini(ini: &Ini, section: &str) -> Result<Self, ConfigError> {
        let properties = ini
            .section(Some(section))
            .context(MissingSectionSnafu { section })?;
        let fallback = ini.section(Some(FALLBACK_SECTION));
        let get = |key: &str| {
            find_key(properties, key)
                .or_else(|| fallback.and_then(|defaults| find_key(defaults, key)))
                .map(str::to_string)
                .context(MissingKeySnafu { section, key })
        };

        Ok(Self {
            account: get(ACCOUNT_KEY)?,
            user: get(USER_KEY)?,
            password: get(PASSWORD_KEY)?,
            role: get(ROLE_KEY)?,
            warehouse: get(WAREHOUSE_KEY)?,
            database: get(DATABASE_KEY)?,
            schema: get(SCHEMA_KEY)?,
        })
    }
}

// Key names match regardless of case; section names do not.
fn find_key<'a>(properties: &'a Properties, key: &str) -> Option<&'a str> {
    properties
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value)
}
