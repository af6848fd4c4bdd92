//! SQL Server Database Engine Implementation
//!
//! This module implements the `DatabaseEngine` trait for Microsoft SQL Server.
//!
//! # Column Encryption
//! Encryption is entirely the driver's job. With `ColumnEncryption=Enabled` in
//! the connection string, the Microsoft ODBC driver asks the server which
//! parameters target encrypted columns, fetches the column encryption keys, and
//! encrypts the bound values before they leave the process. This module only
//! binds plain parameters.
//!
//! # Implementation Notes
//! - Uses `odbc-api` (synchronous ODBC bindings)
//! - Parameters are positional `?` markers bound in column order
//! - Secrets are bound as wide strings so they match `nvarchar` columns exactly;
//!   encrypted columns refuse implicit conversions
//! - The ODBC environment and connection are dropped when `insert_row` returns

use odbc_api::parameter::VarWCharSlice;
use odbc_api::{ConnectionOptions, Environment};
use tracing::{debug, info};

use crate::engine::{
    ensure_engine, AuthMode, ConnectionConfig, DatabaseEngine, DatabaseType, ExecOptions,
    InsertOutcome, DEFAULT_ODBC_DRIVER,
};
use crate::error::{AeDemoError, Result};
use crate::request::InsertRequest;

/// Target table (schema-qualified)
pub const TABLE: &str = "dbo.Table1";

const INSERT_SQL: &str =
    "INSERT INTO dbo.Table1 (id, SecretDeterministic, SecretRandomized) VALUES (?, ?, ?);";

/// SQL Server database engine implementation
pub struct MssqlEngine;

impl DatabaseEngine for MssqlEngine {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Mssql
    }

    fn insert_row(
        &self,
        config: &ConnectionConfig,
        request: &InsertRequest,
        opts: &ExecOptions,
    ) -> Result<InsertOutcome> {
        ensure_engine(config, DatabaseType::Mssql)?;

        let connection_string = build_connection_string(config)?;

        let env = Environment::new().map_err(|e| {
            AeDemoError::engine_error("mssql", format!("Failed to allocate ODBC environment: {e}"))
        })?;

        debug!(target = %config.describe(), "opening connection");
        let conn = env
            .connect_with_connection_string(&connection_string, ConnectionOptions::default())
            .map_err(|e| {
                AeDemoError::connection_failed(format!("Failed to connect to SQL Server: {e}"))
            })?;

        let mut statement = conn.preallocate().map_err(|e| {
            AeDemoError::engine_error("mssql", format!("Failed to allocate statement: {e}"))
        })?;

        if let Some(timeout_secs) = opts.timeout_secs {
            statement.set_query_timeout_sec(timeout_secs).map_err(|e| {
                AeDemoError::engine_error("mssql", format!("Failed to set query timeout: {e}"))
            })?;
        }

        let deterministic: Vec<u16> = request.secret_deterministic.encode_utf16().collect();
        let randomized: Vec<u16> = request.secret_randomized.encode_utf16().collect();
        let params = (
            &request.id,
            &VarWCharSlice::new(&deterministic),
            &VarWCharSlice::new(&randomized),
        );

        statement
            .execute(INSERT_SQL, params)
            .map_err(|e| AeDemoError::query_failed(format!("Insert into {TABLE} failed: {e}")))?;

        let rows_affected = statement
            .row_count()
            .map_err(|e| {
                AeDemoError::engine_error("mssql", format!("Failed to read row count: {e}"))
            })?
            .map_or(0, |n| n as u64);

        info!(id = request.id, rows_affected, "row inserted");

        Ok(InsertOutcome { rows_affected, table: TABLE.to_string() })
    }
}

/// Build the ODBC connection string for a SQL Server config
///
/// WARNING: The result may contain a password. Never log it.
pub fn build_connection_string(config: &ConnectionConfig) -> Result<String> {
    let host = config
        .host
        .as_deref()
        .ok_or_else(|| AeDemoError::invalid_input("SQL Server requires 'host' parameter"))?;

    let database = config
        .database
        .as_deref()
        .ok_or_else(|| AeDemoError::invalid_input("SQL Server requires 'database' parameter"))?;

    let driver = config.driver.as_deref().unwrap_or(DEFAULT_ODBC_DRIVER);

    let mut parts = vec![
        format!("Driver={}", braced(driver)),
        format!("Server={}", escape_value(host)),
        format!("Database={}", escape_value(database)),
    ];

    match &config.auth {
        AuthMode::Integrated => parts.push("Trusted_Connection=yes".to_string()),
        AuthMode::SqlLogin { user, password } => {
            let password = password.as_deref().ok_or_else(|| {
                AeDemoError::config_error(format!("No password configured for SQL login '{user}'"))
            })?;
            parts.push(format!("UID={}", escape_value(user)));
            parts.push(format!("PWD={}", escape_value(password)));
        }
    }

    parts.push(format!(
        "ColumnEncryption={}",
        if config.column_encryption { "Enabled" } else { "Disabled" }
    ));
    parts.push(format!(
        "TrustServerCertificate={}",
        if config.trust_server_certificate { "yes" } else { "no" }
    ));

    Ok(parts.join(";") + ";")
}

/// Quote a value only when ODBC syntax requires it
fn escape_value(value: &str) -> String {
    let needs_braces = value.contains([';', '{', '}', '='])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);

    if needs_braces {
        braced(value)
    } else {
        value.to_string()
    }
}

/// Wrap in braces, doubling any closing brace
fn braced(value: &str) -> String {
    format!("{{{}}}", value.replace('}', "}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_connection_string_for_default_config() {
        let conn_str = build_connection_string(&ConnectionConfig::default()).unwrap();
        assert_eq!(
            conn_str,
            "Driver={ODBC Driver 18 for SQL Server};Server=localhost;Database=AEDemo;\
             Trusted_Connection=yes;ColumnEncryption=Enabled;TrustServerCertificate=no;"
        );
    }

    #[test]
    fn test_connection_string_sql_login() {
        let mut config = ConnectionConfig::mssql("db01,1433".to_string(), "Secrets".to_string());
        config.auth =
            AuthMode::SqlLogin { user: "app".to_string(), password: Some("p;w}d".to_string()) };
        config.trust_server_certificate = true;

        let conn_str = build_connection_string(&config).unwrap();
        assert!(conn_str.contains("Server=db01,1433;"));
        assert!(conn_str.contains("UID=app;"));
        assert!(conn_str.contains("PWD={p;w}}d};"));
        assert!(conn_str.contains("TrustServerCertificate=yes;"));
        assert!(!conn_str.contains("Trusted_Connection"));
    }

    #[test]
    fn test_connection_string_encryption_disabled() {
        let mut config = ConnectionConfig::default();
        config.column_encryption = false;
        let conn_str = build_connection_string(&config).unwrap();
        assert!(conn_str.contains("ColumnEncryption=Disabled;"));
    }

    #[test]
    fn test_connection_string_requires_host_and_password() {
        let mut config = ConnectionConfig::default();
        config.host = None;
        assert_eq!(build_connection_string(&config).unwrap_err().error_code(), "INVALID_INPUT");

        let mut config = ConnectionConfig::default();
        config.auth = AuthMode::SqlLogin { user: "app".to_string(), password: None };
        assert_eq!(build_connection_string(&config).unwrap_err().error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("localhost"), "localhost");
        assert_eq!(escape_value(r"host\SQLEXPRESS"), r"host\SQLEXPRESS");
        assert_eq!(escape_value("a=b"), "{a=b}");
        assert_eq!(escape_value(" padded"), "{ padded}");
    }

    #[test]
    fn test_rejects_sqlite_config() {
        let config = ConnectionConfig::sqlite(std::path::PathBuf::from("/tmp/x.db"));
        let request = InsertRequest::new(1, "a", "b").unwrap();
        let err = MssqlEngine.insert_row(&config, &request, &ExecOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    // Requires a SQL Server with dbo.Table1 and its column master key reachable
    // from this machine (integrated security against localhost/AEDemo).
    #[test]
    #[ignore = "Requires running SQL Server instance with column encryption keys"]
    fn test_insert_against_live_server() {
        let id = i32::try_from(std::process::id() % 1_000_000).unwrap();
        let request = InsertRequest::new(id, "abc", "xyz").unwrap();
        let outcome = MssqlEngine
            .insert_row(&ConnectionConfig::default(), &request, &ExecOptions::default())
            .unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.table, "dbo.Table1");

        // Same id again violates the primary key
        let err = MssqlEngine
            .insert_row(&ConnectionConfig::default(), &request, &ExecOptions::default())
            .unwrap_err();
        assert_eq!(err.error_code(), "QUERY_FAILED");
    }
}
