//! Failure Taxonomy
//!
//! Every way an `aedemo` invocation can fail after the argument count has been
//! accepted. A wrong count is not a failure: it is
//! [`crate::app::RunOutcome::Usage`] and the process exits normally.
//!
//! Failures fall on either side of the connection attempt:
//!
//! | Variant | Code | Typical cause |
//! |---|---|---|
//! | `InvalidInput` | `INVALID_INPUT` | `seven` as the id, an 11-unit secret, `--engine oracle` |
//! | `ConfigError` | `CONFIG_ERROR` | unreadable `.aedemo/config.json`, unknown `--name`, unset `password_env` |
//! | `ConnectionFailed` | `CONNECTION_FAILED` | server unreachable, login failed, no ODBC driver |
//! | `QueryFailed` | `QUERY_FAILED` | reused id (PRIMARY KEY), column master key not accessible |
//! | `EngineError` | `ENGINE_ERROR` | ODBC handle allocation, row count unavailable, SQLite close |
//!
//! The first two are raised before any connection is opened.
//! Messages never carry the connection string, so a password given through
//! `AEDEMO_PASSWORD` or `password_env` cannot leak into stderr or a JSON envelope.

use thiserror::Error;

/// Why the row was not inserted
#[derive(Error, Debug)]
pub enum AeDemoError {
    /// The id or a secret cannot be stored in `dbo.Table1`
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The driver could not open or authenticate the connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The server refused the INSERT
    ///
    /// Includes errors raised by the driver while encrypting the parameters,
    /// since those surface when the statement executes.
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Driver plumbing failed around an otherwise valid insert
    #[error("Engine error ({engine}): {detail}")]
    EngineError { engine: String, detail: String },

    /// Connection settings could not be resolved
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AeDemoError {
    /// Stable code used in the JSON error envelope
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::EngineError { .. } => "ENGINE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the failure happened after a connection attempt started
    ///
    /// `false` means the database was never contacted.
    #[must_use]
    pub const fn reached_database(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::QueryFailed(_) | Self::EngineError { .. })
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// `engine` is the [`crate::engine::DatabaseType`] name (`mssql`, `sqlite`)
    pub fn engine_error(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::EngineError { engine: engine.into(), detail: detail.into() }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AeDemoError>;
