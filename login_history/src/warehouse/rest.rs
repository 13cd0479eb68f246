use crate::parameters::ConnectionParameters;
use crate::warehouse::{SaveMode, SessionBuilder, TableRef, WarehouseSession};
use sf_session::{Session, SessionError, Setting, Settings};
use snafu::{Location, ResultExt, Snafu, ensure};
use std::collections::HashMap;

#[derive(Debug, Snafu)]
pub enum WarehouseError {
    #[snafu(display("Invalid table name: {name}"))]
    InvalidTableName {
        name: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("{source}"))]
    Session {
        source: SessionError,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Builds [`Session`]s over the Snowflake REST API.
#[derive(Clone, Debug, Default)]
pub struct RestSessionBuilder {
    server_url: Option<String>,
}

impl RestSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends requests to `server_url` instead of the account's public endpoint.
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    pub fn settings(&self, parameters: &ConnectionParameters) -> HashMap<String, Setting> {
        let mut settings = HashMap::new();
        settings.set_string("application", env!("CARGO_PKG_NAME").to_string());
        settings.set_string("account", parameters.account.clone());
        settings.set_string("user", parameters.user.clone());
        settings.set_string("password", parameters.password.clone());
        settings.set_string("role", parameters.role.clone());
        settings.set_string("warehouse", parameters.warehouse.clone());
        settings.set_string("database", parameters.database.clone());
        settings.set_string("schema", parameters.schema.clone());
        if let Some(server_url) = &self.server_url {
            settings.set_string("server_url", server_url.clone());
        }
        settings
    }
}

impl SessionBuilder for RestSessionBuilder {
    type Session = Session;
    type Error = WarehouseError;

    fn create(&self, parameters: ConnectionParameters) -> Result<Session, WarehouseError> {
        Session::from_settings(&self.settings(&parameters)).context(SessionSnafu)
    }
}

impl WarehouseSession for Session {
    type Error = WarehouseError;

    fn table(&self, qualified_name: &str) -> Result<TableRef, WarehouseError> {
        validate_table_name(qualified_name)?;
        Ok(TableRef::new(qualified_name))
    }

    fn save_as_table(
        &self,
        source: &TableRef,
        table_name: &str,
        mode: SaveMode,
    ) -> Result<(), WarehouseError> {
        let sql = save_as_table_sql(source, table_name, mode)?;
        tracing::info!(
            source = source.qualified_name(),
            target = table_name,
            mode = mode.as_str(),
            "Saving table"
        );
        let result = self.execute(&sql).context(SessionSnafu)?;
        tracing::debug!(query_id = ?result.query_id, "Table saved");
        Ok(())
    }
}

pub fn save_as_table_sql(
    source: &TableRef,
    table_name: &str,
    mode: SaveMode,
) -> Result<String, WarehouseError> {
    validate_table_name(source.qualified_name())?;
    validate_table_name(table_name)?;
    let source = source.qualified_name();
    Ok(match mode {
        SaveMode::Overwrite => {
            format!("CREATE OR REPLACE TABLE {table_name} AS SELECT * FROM {source}")
        }
        SaveMode::Append => format!("INSERT INTO {table_name} SELECT * FROM {source}"),
        SaveMode::ErrorIfExists => format!("CREATE TABLE {table_name} AS SELECT * FROM {source}"),
        SaveMode::Ignore => {
            format!("CREATE TABLE IF NOT EXISTS {table_name} AS SELECT * FROM {source}")
        }
    })
}

/// Accepts `name`, `schema.name` or `database.schema.name`, where each part is a
/// plain identifier or a double-quoted one without dots or quotes inside.
pub fn validate_table_name(name: &str) -> Result<(), WarehouseError> {
    let parts: Vec<&str> = name.split('.').collect();
    ensure!(
        parts.len() <= 3 && parts.iter().all(|part| is_identifier(part)),
        InvalidTableNameSnafu { name }
    );
    Ok(())
}

fn is_identifier(part: &str) -> bool {
    if let Some(quoted) = part.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        return !quoted.is_empty() && !quoted.contains('"');
    }
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("loginhistory")]
    #[test_case("SNOWFLAKE.ACCOUNT_USAGE.LOGIN_HISTORY")]
    #[test_case("PUBLIC.\"Login History\"")]
    #[test_case("_staging$1")]
    fn accepts_table_names(name: &str) {
        assert!(validate_table_name(name).is_ok());
    }

    #[test_case("")]
    #[test_case("a.b.c.d")]
    #[test_case("1table")]
    #[test_case("loginhistory; DROP TABLE users")]
    #[test_case("schema..table")]
    #[test_case("\"\"")]
    #[test_case("\"unterminated")]
    fn rejects_table_names(name: &str) {
        assert!(matches!(
            validate_table_name(name),
            Err(WarehouseError::InvalidTableName { .. })
        ));
    }

    #[test_case(SaveMode::Overwrite, "CREATE OR REPLACE TABLE loginhistory AS SELECT * FROM DB.S.T")]
    #[test_case(SaveMode::Append, "INSERT INTO loginhistory SELECT * FROM DB.S.T")]
    #[test_case(SaveMode::ErrorIfExists, "CREATE TABLE loginhistory AS SELECT * FROM DB.S.T")]
    #[test_case(SaveMode::Ignore, "CREATE TABLE IF NOT EXISTS loginhistory AS SELECT * FROM DB.S.T")]
    fn renders_save_mode(mode: SaveMode, expected: &str) {
        let sql = save_as_table_sql(&TableRef::new("DB.S.T"), "loginhistory", mode).unwrap();
        assert_eq!(sql, expected);
    }

    #[test]
    fn settings_carry_parameters_unchanged() {
        let parameters = ConnectionParameters {
            account: "acct".to_string(),
            user: "alice".to_string(),
            password: "secret".to_string(),
            role: "ANALYST".to_string(),
            warehouse: "WH".to_string(),
            database: "DB".to_string(),
            schema: "PUBLIC".to_string(),
        };
        let settings = RestSessionBuilder::new()
            .with_server_url("http://127.0.0.1:1")
            .settings(&parameters);

        assert_eq!(settings.get_string("account").as_deref(), Some("acct"));
        assert_eq!(settings.get_string("user").as_deref(), Some("alice"));
        assert_eq!(settings.get_string("password").as_deref(), Some("secret"));
        assert_eq!(settings.get_string("role").as_deref(), Some("ANALYST"));
        assert_eq!(settings.get_string("warehouse").as_deref(), Some("WH"));
        assert_eq!(settings.get_string("database").as_deref(), Some("DB"));
        assert_eq!(settings.get_string("schema").as_deref(), Some("PUBLIC"));
        assert_eq!(
            settings.get_string("server_url").as_deref(),
            Some("http://127.0.0.1:1")
        );
    }
}
