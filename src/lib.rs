//! AEDemo - Insert One Row Into a Column-Encrypted Table
//!
//! AEDemo takes an id and two secrets from the command line and inserts them
//! as one row into `dbo.Table1` through a parameterized statement. The
//! `SecretDeterministic` and `SecretRandomized` columns are protected by SQL
//! Server column encryption; the ODBC driver encrypts the bound values, the
//! program never sees key material.
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`request`] - Argument parsing into an [`InsertRequest`]
//! - [`config`] - Connection configuration resolution
//! - [`engine`] - Database engine trait and implementations
//! - [`app`] - The run flow
//! - [`output`] - Text and JSON output
//! - [`logging`] - Subscriber setup

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod request;

// Re-export commonly used types for convenience
pub use app::{run, RunOutcome, Target, SUCCESS_MESSAGE};
pub use config::{resolve_config, resolve_config_with, ConfigFile, Overrides, StoredConnection};
pub use engine::{
    engine_for, AuthMode, ConnectionConfig, DatabaseEngine, DatabaseType, ExecOptions,
    InsertOutcome,
};
pub use error::{AeDemoError, Result};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, OutputFormat, SuccessEnvelope};
pub use request::{InsertRequest, ParsedArgs, USAGE_MESSAGE};
