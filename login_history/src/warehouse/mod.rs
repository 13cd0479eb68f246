mod rest;

pub use rest::{RestSessionBuilder, WarehouseError, save_as_table_sql, validate_table_name};

use crate::parameters::ConnectionParameters;

/// How a write treats a target table that already exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveMode {
    /// Replace the table and its contents.
    Overwrite,
    Append,
    /// Fail if the table exists.
    ErrorIfExists,
    /// Leave an existing table untouched.
    Ignore,
}

impl SaveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveMode::Overwrite => "overwrite",
            SaveMode::Append => "append",
            SaveMode::ErrorIfExists => "errorifexists",
            SaveMode::Ignore => "ignore",
        }
    }
}

/// Lazy reference to a remote table. Holding one performs no I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRef {
    qualified_name: String,
}

impl TableRef {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }
}

/// Creates authenticated sessions from connection parameters.
pub trait SessionBuilder {
    type Session: WarehouseSession;
    type Error: std::error::Error + 'static;

    fn create(&self, parameters: ConnectionParameters) -> Result<Self::Session, Self::Error>;
}

/// The two table operations the refresh needs from a session.
pub trait WarehouseSession {
    type Error: std::error::Error + 'static;

    fn table(&self, qualified_name: &str) -> Result<TableRef, Self::Error>;

    /// Persists the full contents of `source` as `table_name`.
    fn save_as_table(
        &self,
        source: &TableRef,
        table_name: &str,
        mode: SaveMode,
    ) -> Result<(), Self::Error>;
}
