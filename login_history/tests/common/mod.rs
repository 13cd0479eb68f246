#![allow(dead_code)]

use login_history::ConnectionParameters;
use login_history::warehouse::{SaveMode, SessionBuilder, TableRef, WarehouseSession};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

pub const VALID_CONFIG: &str = "\
[SNOWPARKAWS]
SNOWFLAKE_ACCOUNT = myorg-acct
SNOWFLAKE_USER = alice
SNOWFLAKE_PASSWORD = hunter2
SNOWFLAKE_ROLE = ACCOUNTADMIN
SNOWFLAKE_WAREHOUSE = COMPUTE_WH
SNOWFLAKE_DATABASE = ANALYTICS
SNOWFLAKE_SCHEMA = PUBLIC
";

pub fn expected_parameters() -> ConnectionParameters {
    ConnectionParameters {
        account: "myorg-acct".to_string(),
        user: "alice".to_string(),
        password: "hunter2".to_string(),
        role: "ACCOUNTADMIN".to_string(),
        warehouse: "COMPUTE_WH".to_string(),
        database: "ANALYTICS".to_string(),
        schema: "PUBLIC".to_string(),
    }
}

pub fn config_without(key: &str) -> String {
    VALID_CONFIG
        .lines()
        .filter(|line| !line.starts_with(&format!("{key} ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("credentials.cfg");
    std::fs::write(&path, contents).unwrap();
    path
}

#[derive(Debug)]
pub struct FakeError(pub String);

impl std::fmt::Display for FakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FakeError {}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Table(String),
    SaveAsTable {
        source: String,
        target: String,
        mode: SaveMode,
    },
}

/// Warehouse kept in memory: tables are row vectors, writes honour [`SaveMode`].
#[derive(Default)]
pub struct FakeSession {
    pub tables: RefCell<HashMap<String, Vec<String>>>,
    pub calls: RefCell<Vec<Call>>,
    pub fail_table: Option<String>,
    pub fail_save: Option<String>,
}

impl FakeSession {
    pub fn with_table(name: &str, rows: &[&str]) -> Self {
        let session = Self::default();
        session.tables.borrow_mut().insert(
            name.to_string(),
            rows.iter().map(|row| row.to_string()).collect(),
        );
        session
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.tables.borrow().get(table).map(Vec::len)
    }
}

impl WarehouseSession for FakeSession {
    type Error = FakeError;

    fn table(&self, qualified_name: &str) -> Result<TableRef, FakeError> {
        self.calls
            .borrow_mut()
            .push(Call::Table(qualified_name.to_string()));
        if let Some(message) = &self.fail_table {
            return Err(FakeError(message.clone()));
        }
        Ok(TableRef::new(qualified_name))
    }

    fn save_as_table(
        &self,
        source: &TableRef,
        table_name: &str,
        mode: SaveMode,
    ) -> Result<(), FakeError> {
        self.calls.borrow_mut().push(Call::SaveAsTable {
            source: source.qualified_name().to_string(),
            target: table_name.to_string(),
            mode,
        });
        if let Some(message) = &self.fail_save {
            return Err(FakeError(message.clone()));
        }

        let mut tables = self.tables.borrow_mut();
        let rows = tables
            .get(source.qualified_name())
            .cloned()
            .ok_or_else(|| FakeError(format!("{} does not exist", source.qualified_name())))?;
        match mode {
            SaveMode::Overwrite => {
                tables.insert(table_name.to_string(), rows);
            }
            SaveMode::Append => tables.entry(table_name.to_string()).or_default().extend(rows),
            SaveMode::ErrorIfExists if tables.contains_key(table_name) => {
                return Err(FakeError(format!("{table_name} already exists")));
            }
            SaveMode::ErrorIfExists | SaveMode::Ignore => {
                tables.entry(table_name.to_string()).or_insert(rows);
            }
        }
        Ok(())
    }
}

/// Records every `create` call and hands out empty fake sessions.
#[derive(Default)]
pub struct RecordingBuilder {
    pub created: RefCell<Vec<ConnectionParameters>>,
    pub reject_with: Option<String>,
}

impl RecordingBuilder {
    pub fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl SessionBuilder for RecordingBuilder {
    type Session = FakeSession;
    type Error = FakeError;

    fn create(&self, parameters: ConnectionParameters) -> Result<FakeSession, FakeError> {
        self.created.borrow_mut().push(parameters);
        match &self.reject_with {
            Some(message) => Err(FakeError(message.clone())),
            None => Ok(FakeSession::default()),
        }
    }
}
