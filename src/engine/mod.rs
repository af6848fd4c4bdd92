//! Database Engine Traits and Core Types
//!
//! This module defines the core abstractions for database engines.
//! Each engine (SQL Server, `SQLite`) implements the `DatabaseEngine` trait.
//!
//! # Scoped Connections
//! Engines hold no state. `insert_row` opens a connection from the
//! `ConnectionConfig`, executes the insert, and releases the connection before
//! returning. The connection is owned by the call, so it is dropped on every
//! path, including early returns through `?`.
//!
//! # Engine Isolation
//! Each engine implementation is completely independent and owns its own SQL
//! text. SQL Server targets `dbo.Table1` with column encryption applied by the
//! ODBC driver; `SQLite` targets a plain `Table1` for local runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AeDemoError, Result};
use crate::request::InsertRequest;

#[cfg(feature = "mssql")]
pub mod mssql;

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Default ODBC driver name for SQL Server connections
pub const DEFAULT_ODBC_DRIVER: &str = "ODBC Driver 18 for SQL Server";

/// Supported database engine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Microsoft SQL Server (via ODBC)
    Mssql,
    /// `SQLite` database
    SQLite,
}

impl DatabaseType {
    /// Get the engine name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mssql => "mssql",
            Self::SQLite => "sqlite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = AeDemoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mssql" | "sqlserver" => Ok(Self::Mssql),
            "sqlite" => Ok(Self::SQLite),
            other => Err(AeDemoError::invalid_input(format!(
                "Unknown engine '{other}' (expected 'mssql' or 'sqlite')"
            ))),
        }
    }
}

/// How the client authenticates against SQL Server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthMode {
    /// Windows / Kerberos integrated security (`Trusted_Connection=yes`)
    #[default]
    Integrated,

    /// SQL Server login
    SqlLogin {
        user: String,

        /// WARNING: Sensitive data, do not log or include in error messages
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
}

/// Connection configuration for database engines
///
/// Fields are engine-specific: `file` only applies to `SQLite`, everything
/// else to SQL Server. The default value is the demonstration connection:
/// `localhost`, catalog `AEDemo`, integrated security, column encryption on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Database engine type
    pub engine: DatabaseType,

    /// Server name, optionally `host\instance` or `host,port`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Initial catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Authentication mode
    pub auth: AuthMode,

    /// Let the driver encrypt/decrypt parameters bound to encrypted columns
    pub column_encryption: bool,

    /// Accept the server certificate without validation
    pub trust_server_certificate: bool,

    /// ODBC driver name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    /// Database file path (for sqlite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::mssql("localhost".to_string(), "AEDemo".to_string())
    }
}

impl ConnectionConfig {
    /// Create a SQL Server connection config with integrated security and
    /// column encryption enabled
    #[must_use]
    pub fn mssql(host: String, database: String) -> Self {
        Self {
            engine: DatabaseType::Mssql,
            host: Some(host),
            database: Some(database),
            auth: AuthMode::Integrated,
            column_encryption: true,
            trust_server_certificate: false,
            driver: Some(DEFAULT_ODBC_DRIVER.to_string()),
            file: None,
        }
    }

    /// Create a new `SQLite` connection config
    #[must_use]
    pub fn sqlite(file: PathBuf) -> Self {
        Self {
            engine: DatabaseType::SQLite,
            host: None,
            database: None,
            auth: AuthMode::Integrated,
            column_encryption: false,
            trust_server_certificate: false,
            driver: None,
            file: Some(file),
        }
    }

    /// Short description of the target, safe for logs (no credentials)
    #[must_use]
    pub fn describe(&self) -> String {
        match self.engine {
            DatabaseType::Mssql => format!(
                "mssql://{}/{} (column encryption {})",
                self.host.as_deref().unwrap_or("?"),
                self.database.as_deref().unwrap_or("?"),
                if self.column_encryption { "enabled" } else { "disabled" }
            ),
            DatabaseType::SQLite => format!(
                "sqlite://{}",
                self.file.as_ref().map_or_else(|| "?".to_string(), |f| f.display().to_string())
            ),
        }
    }
}

/// Execution options passed through to the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOptions {
    /// Statement timeout in seconds. None leaves the driver default in place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<usize>,
}

/// Result of a successful insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    /// Rows reported as affected by the driver
    pub rows_affected: u64,

    /// Table the row was written to
    pub table: String,
}

/// Database engine trait
///
/// Each call is self-contained: open, execute one insert as a non-query,
/// release. No connection outlives the call.
pub trait DatabaseEngine {
    /// Engine type this implementation serves
    fn database_type(&self) -> DatabaseType;

    /// Insert one row built from `request`
    ///
    /// Connection errors map to `ConnectionFailed`, statement errors (duplicate
    /// key, type clash, encryption metadata problems) to `QueryFailed`.
    fn insert_row(
        &self,
        config: &ConnectionConfig,
        request: &InsertRequest,
        opts: &ExecOptions,
    ) -> Result<InsertOutcome>;
}

/// Pick the engine implementation for a database type
///
/// Fails when the engine was compiled out through Cargo features.
pub fn engine_for(engine: DatabaseType) -> Result<Box<dyn DatabaseEngine>> {
    match engine {
        #[cfg(feature = "mssql")]
        DatabaseType::Mssql => Ok(Box::new(mssql::MssqlEngine)),
        #[cfg(feature = "sqlite")]
        DatabaseType::SQLite => Ok(Box::new(sqlite::SqliteEngine)),
        #[allow(unreachable_patterns)]
        other => Err(AeDemoError::config_error(format!(
            "Engine '{other}' is not available in this build (enable the '{other}' feature)"
        ))),
    }
}

/// Reject a config meant for another engine
pub(crate) fn ensure_engine(config: &ConnectionConfig, expected: DatabaseType) -> Result<()> {
    if config.engine != expected {
        return Err(AeDemoError::invalid_input(format!(
            "Expected {expected} engine, got {}",
            config.engine
        )));
    }
    Ok(())
}
