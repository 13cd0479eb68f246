use crate::config::settings::Settings;
use crate::config::{ConfigError, InvalidParameterValueSnafu, MissingParameterSnafu};
use snafu::OptionExt;

const SNOWFLAKE_DOMAIN: &str = "snowflakecomputing.com";

fn get_server_url(settings: &dyn Settings) -> Result<String, ConfigError> {
    if let Some(value) = settings.get_string("server_url") {
        return Ok(value.trim_end_matches('/').to_string());
    }

    let protocol = settings
        .get_string("protocol")
        .unwrap_or("https".to_string());
    if protocol != "https" && protocol != "http" {
        return InvalidParameterValueSnafu {
            parameter: "protocol",
            value: protocol,
            explanation: "Allowed values are http and https",
        }
        .fail();
    }

    // Fall back to the public endpoint of the account when no host is given
    let host = match settings.get_string("host") {
        Some(host) => host,
        None => {
            let account = settings
                .get_string("account")
                .context(MissingParameterSnafu { parameter: "host" })?;
            format!("{account}.{SNOWFLAKE_DOMAIN}")
        }
    };

    let base_url = format!("{protocol}://{host}");
    if let Some(port) = settings.get_int("port") {
        return Ok(format!("{base_url}:{port}"));
    }

    Ok(base_url)
}

#[derive(Clone, Debug)]
pub struct ClientInfo {
    pub application: String,
    pub version: String,
    pub os: String,
    pub os_version: String,
    pub ocsp_mode: Option<String>,
}

impl ClientInfo {
    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        Ok(ClientInfo {
            application: settings
                .get_string("application")
                .unwrap_or(env!("CARGO_PKG_NAME").to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            os_version: std::env::consts::ARCH.to_string(),
            ocsp_mode: Some("FAIL_OPEN".to_string()),
        })
    }
}

#[derive(Clone, Debug)]
pub struct QueryParameters {
    pub server_url: String,
    pub client_info: ClientInfo,
}

impl QueryParameters {
    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            server_url: get_server_url(settings)?,
            client_info: ClientInfo::from_settings(settings)?,
        })
    }
}

pub struct LoginParameters {
    pub account_name: String,
    pub username: String,
    pub password: String,
    pub server_url: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub client_info: ClientInfo,
}

impl LoginParameters {
    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            account_name: settings
                .get_string("account")
                .context(MissingParameterSnafu {
                    parameter: "account",
                })?,
            username: settings
                .get_string("user")
                .context(MissingParameterSnafu { parameter: "user" })?,
            password: settings
                .get_string("password")
                .context(MissingParameterSnafu {
                    parameter: "password",
                })?,
            server_url: get_server_url(settings)?,
            database: settings.get_string("database"),
            schema: settings.get_string("schema"),
            warehouse: settings.get_string("warehouse"),
            role: settings.get_string("role"),
            client_info: ClientInfo::from_settings(settings)?,
        })
    }

    pub fn query_parameters(&self) -> QueryParameters {
        QueryParameters {
            server_url: self.server_url.clone(),
            client_info: self.client_info.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Setting;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, Setting)]) -> HashMap<String, Setting> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn string(value: &str) -> Setting {
        Setting::String(value.to_string())
    }

    #[test]
    fn server_url_defaults_to_account_endpoint() {
        let settings = settings(&[("account", string("myorg-acct"))]);
        assert_eq!(
            get_server_url(&settings).unwrap(),
            "https://myorg-acct.snowflakecomputing.com"
        );
    }

    #[test]
    fn explicit_server_url_wins() {
        let settings = settings(&[
            ("account", string("acct")),
            ("host", string("ignored.example.com")),
            ("server_url", string("http://127.0.0.1:4040/")),
        ]);
        assert_eq!(get_server_url(&settings).unwrap(), "http://127.0.0.1:4040");
    }

    #[test]
    fn host_protocol_and_port_are_combined() {
        let settings = settings(&[
            ("host", string("localhost")),
            ("protocol", string("http")),
            ("port", Setting::Int(8080)),
        ]);
        assert_eq!(get_server_url(&settings).unwrap(), "http://localhost:8080");
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let settings = settings(&[("host", string("localhost")), ("protocol", string("ftp"))]);
        assert!(matches!(
            get_server_url(&settings),
            Err(ConfigError::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn login_parameters_require_password() {
        let settings = settings(&[("account", string("acct")), ("user", string("alice"))]);
        match LoginParameters::from_settings(&settings) {
            Err(ConfigError::MissingParameter { parameter, .. }) => {
                assert_eq!(parameter, "password")
            }
            Err(other) => panic!("expected MissingParameter, got {other:?}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn login_parameters_keep_optional_context() {
        let settings = settings(&[
            ("account", string("acct")),
            ("user", string("alice")),
            ("password", string("secret")),
            ("role", string("ANALYST")),
            ("warehouse", string("WH")),
        ]);
        let parameters = LoginParameters::from_settings(&settings).unwrap();
        assert_eq!(parameters.account_name, "acct");
        assert_eq!(parameters.username, "alice");
        assert_eq!(parameters.role.as_deref(), Some("ANALYST"));
        assert_eq!(parameters.warehouse.as_deref(), Some("WH"));
        assert_eq!(parameters.database, None);
        assert_eq!(parameters.schema, None);
    }
}
