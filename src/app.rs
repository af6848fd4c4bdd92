//! Insert Executor
//!
//! The whole program flow as one function: check the arguments, resolve the
//! target, insert, report. The target is resolved lazily so a usage error or a
//! bad id never touches configuration or the database.

use std::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::{ConnectionConfig, DatabaseEngine, ExecOptions, InsertOutcome};
use crate::error::Result;
use crate::request::{InsertRequest, ParsedArgs};

/// Message printed after a successful insert
pub const SUCCESS_MESSAGE: &str = "Row inserted successfully";

/// Where the row goes: the resolved config and the engine that serves it
pub struct Target {
    pub config: ConnectionConfig,
    pub engine: Box<dyn DatabaseEngine>,
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Wrong argument count; nothing was executed
    Usage,

    /// The row was written
    Inserted {
        /// Engine name (`mssql`, `sqlite`)
        engine: String,
        outcome: InsertOutcome,
        execution_ms: u64,
    },
}

/// Run one invocation
///
/// `args` are the positional arguments without the program name. `resolve` is
/// called at most once, and only after the arguments are known to be valid.
pub fn run<S, F>(args: &[S], opts: &ExecOptions, resolve: F) -> Result<RunOutcome>
where
    S: AsRef<str>,
    F: FnOnce() -> Result<Target>,
{
    let request = match InsertRequest::from_args(args)? {
        ParsedArgs::Usage => {
            debug!(count = args.len(), "wrong argument count");
            return Ok(RunOutcome::Usage);
        }
        ParsedArgs::Request(request) => request,
    };

    let target = resolve()?;
    info!(id = request.id, target = %target.config.describe(), "inserting row");

    let start = Instant::now();
    let outcome = target.engine.insert_row(&target.config, &request, opts).map_err(|err| {
        warn!(code = err.error_code(), reached_database = err.reached_database(), "insert failed");
        err
    })?;
    let execution_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    Ok(RunOutcome::Inserted {
        engine: target.engine.database_type().to_string(),
        outcome,
        execution_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DatabaseType;
    use crate::error::AeDemoError;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Engine double that records every request it sees
    struct RecordingEngine {
        calls: Rc<RefCell<Vec<InsertRequest>>>,
        fail_with: Option<fn() -> AeDemoError>,
    }

    impl DatabaseEngine for RecordingEngine {
        fn database_type(&self) -> DatabaseType {
            DatabaseType::Mssql
        }

        fn insert_row(
            &self,
            _config: &ConnectionConfig,
            request: &InsertRequest,
            _opts: &ExecOptions,
        ) -> Result<InsertOutcome> {
            self.calls.borrow_mut().push(request.clone());
            match self.fail_with {
                Some(make_err) => Err(make_err()),
                None => Ok(InsertOutcome { rows_affected: 1, table: "dbo.Table1".to_string() }),
            }
        }
    }

    fn target(
        calls: &Rc<RefCell<Vec<InsertRequest>>>,
        fail_with: Option<fn() -> AeDemoError>,
    ) -> Target {
        Target {
            config: ConnectionConfig::default(),
            engine: Box::new(RecordingEngine { calls: Rc::clone(calls), fail_with }),
        }
    }

    #[test]
    fn test_inserts_one_row() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let outcome =
            run(&["7", "abc", "xyz"], &ExecOptions::default(), || Ok(target(&calls, None))).unwrap();

        match outcome {
            RunOutcome::Inserted { engine, outcome, .. } => {
                assert_eq!(engine, "mssql");
                assert_eq!(outcome.rows_affected, 1);
            }
            RunOutcome::Usage => panic!("expected insert"),
        }
        assert_eq!(*calls.borrow(), vec![InsertRequest::new(7, "abc", "xyz").unwrap()]);
    }

    #[test]
    fn test_usage_never_resolves_target() {
        let mut resolved = false;
        let outcome = run(&["7", "abc"], &ExecOptions::default(), || {
            resolved = true;
            Err(AeDemoError::config_error("must not be called"))
        })
        .unwrap();

        assert_eq!(outcome, RunOutcome::Usage);
        assert!(!resolved);
    }

    #[test]
    fn test_bad_id_never_resolves_target() {
        let mut resolved = false;
        let err = run(&["x", "abc", "xyz"], &ExecOptions::default(), || {
            resolved = true;
            Err(AeDemoError::config_error("must not be called"))
        })
        .unwrap_err();

        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(!resolved);
    }

    #[test]
    fn test_oversized_secret_never_reaches_engine() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let err = run(&["1", "abcdefghijk", "xyz"], &ExecOptions::default(), || {
            Ok(target(&calls, None))
        })
        .unwrap_err();

        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(calls.borrow().is_empty());
    }

    fn duplicate_key() -> AeDemoError {
        AeDemoError::query_failed("duplicate key")
    }

    #[test]
    fn test_engine_error_propagates_unchanged() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let err = run(&["7", "abc", "xyz"], &ExecOptions::default(), || {
            Ok(target(&calls, Some(duplicate_key as fn() -> AeDemoError)))
        })
        .unwrap_err();

        assert_eq!(err.error_code(), "QUERY_FAILED");
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_resolve_error_propagates() {
        let err = run(&["7", "abc", "xyz"], &ExecOptions::default(), || {
            Err(AeDemoError::config_error("bad config"))
        })
        .unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}
