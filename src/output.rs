//! Output Rendering
//!
//! Text mode prints the plain messages a person expects at a terminal. JSON
//! mode prints exactly one envelope per run:
//! - Success: `{"ok": true, "engine": "...", "command": "insert", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "engine": "...", "command": "insert", "error": {"code": "...", "message": "..."}}`
//!
//! Logs never go to stdout.

use serde::{Deserialize, Serialize};

use crate::app::{RunOutcome, SUCCESS_MESSAGE};
use crate::engine::InsertOutcome;
use crate::error::AeDemoError;
use crate::request::USAGE_MESSAGE;

/// Command name reported in envelopes
pub const COMMAND: &str = "insert";

/// Error code for a wrong argument count
pub const USAGE_CODE: &str = "USAGE";

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain messages
    #[default]
    Text,
    /// One JSON envelope
    Json,
}

/// Success envelope for operation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Database engine used for this operation (mssql, sqlite)
    pub engine: String,

    /// Command that was executed
    pub command: String,

    /// Operation-specific data
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    /// Create a new success envelope
    pub fn new(engine: impl Into<String>, command: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self { ok: true, engine: engine.into(), command: command.into(), data, meta }
    }
}

/// Error envelope for operation failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// Database engine (empty string if not known yet)
    pub engine: String,

    /// Command that was attempted
    pub command: String,

    /// Error information
    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    /// Create a new error envelope
    pub fn new(engine: impl Into<String>, command: impl Into<String>, error: ErrorInfo) -> Self {
        Self { ok: false, engine: engine.into(), command: command.into(), error }
    }

    /// Create error envelope from `AeDemoError`
    pub fn from_error(
        engine: impl Into<String>,
        command: impl Into<String>,
        err: &AeDemoError,
    ) -> Self {
        Self::new(engine, command, ErrorInfo::new(err.error_code(), err.message()))
    }
}

/// Error information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "USAGE", "CONNECTION_FAILED")
    pub code: String,

    /// Human-readable error message (no credentials)
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error info
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

/// Execution metadata included in success responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,
}

impl Metadata {
    /// Create new metadata
    pub fn new(execution_ms: u64) -> Self {
        Self { execution_ms }
    }
}

/// Render the outcome of a run for stdout
pub fn render_outcome(
    format: OutputFormat,
    engine: &str,
    outcome: &RunOutcome,
) -> serde_json::Result<String> {
    match (format, outcome) {
        (OutputFormat::Text, RunOutcome::Usage) => Ok(USAGE_MESSAGE.to_string()),
        (OutputFormat::Text, RunOutcome::Inserted { .. }) => Ok(SUCCESS_MESSAGE.to_string()),
        (OutputFormat::Json, RunOutcome::Usage) => serde_json::to_string(&ErrorEnvelope::new(
            engine,
            COMMAND,
            ErrorInfo::new(USAGE_CODE, USAGE_MESSAGE),
        )),
        (OutputFormat::Json, RunOutcome::Inserted { engine, outcome, execution_ms }) => {
            serde_json::to_string(&SuccessEnvelope::<&InsertOutcome>::new(
                engine.as_str(),
                COMMAND,
                outcome,
                Metadata::new(*execution_ms),
            ))
        }
    }
}

/// Render an error for stdout
///
/// Text mode returns None: the error is reported on stderr by the process exit.
pub fn render_error(
    format: OutputFormat,
    engine: &str,
    err: &AeDemoError,
) -> serde_json::Result<Option<String>> {
    match format {
        OutputFormat::Text => Ok(None),
        OutputFormat::Json => {
            serde_json::to_string(&ErrorEnvelope::from_error(engine, COMMAND, err)).map(Some)
        }
    }
}
