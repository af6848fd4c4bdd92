//! `SQLite` Database Engine Implementation
//!
//! This module implements the `DatabaseEngine` trait for `SQLite` databases.
//! It exists for local runs and tests without a SQL Server: the same insert,
//! same parameters, no column encryption.
//!
//! # Implementation Notes
//! - Uses `rusqlite` (synchronous driver)
//! - The database file must already exist and contain `Table1`; nothing is created
//! - Timeouts enforced via `busy_timeout`
//! - No schema qualifier (`SQLite` has no `dbo` schema)

use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use crate::engine::{
    ensure_engine, ConnectionConfig, DatabaseEngine, DatabaseType, ExecOptions, InsertOutcome,
};
use crate::error::{AeDemoError, Result};
use crate::request::InsertRequest;

/// Target table
pub const TABLE: &str = "Table1";

const INSERT_SQL: &str =
    "INSERT INTO Table1 (id, SecretDeterministic, SecretRandomized) VALUES (?1, ?2, ?3)";

/// `SQLite` database engine implementation
pub struct SqliteEngine;

impl DatabaseEngine for SqliteEngine {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn insert_row(
        &self,
        config: &ConnectionConfig,
        request: &InsertRequest,
        opts: &ExecOptions,
    ) -> Result<InsertOutcome> {
        ensure_engine(config, DatabaseType::SQLite)?;

        let file_path = config
            .file
            .as_ref()
            .ok_or_else(|| AeDemoError::invalid_input("SQLite requires 'file' parameter"))?;

        let path_str = file_path.to_str().ok_or_else(|| {
            AeDemoError::invalid_input("SQLite file path contains invalid UTF-8 characters")
        })?;

        debug!(target = %config.describe(), "opening connection");
        let conn = open_connection(path_str)?;

        if let Some(timeout_secs) = opts.timeout_secs {
            let timeout = std::time::Duration::from_secs(timeout_secs as u64);
            conn.busy_timeout(timeout).map_err(|e| {
                AeDemoError::engine_error("sqlite", format!("Failed to set timeout: {e}"))
            })?;
        }

        let rows_affected = conn
            .execute(
                INSERT_SQL,
                params![request.id, request.secret_deterministic, request.secret_randomized],
            )
            .map_err(|e| AeDemoError::query_failed(format!("Insert into {TABLE} failed: {e}")))?;

        conn.close().map_err(|(_, e)| {
            AeDemoError::engine_error("sqlite", format!("Failed to close database: {e}"))
        })?;

        info!(id = request.id, rows_affected, "row inserted");

        Ok(InsertOutcome { rows_affected: rows_affected as u64, table: TABLE.to_string() })
    }
}

/// Open an existing `SQLite` database for writing
fn open_connection(path: &str) -> Result<Connection> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
        .map_err(|e| AeDemoError::connection_failed(format!("Failed to open SQLite database: {e}")))
}
