//! AEDemo CLI Entry Point
//!
//! `aedemo [OPTIONS] <id> <secretDeterministic> <secretRandomized>`
//!
//! Options go before the positionals. Once the id is seen every remaining word is
//! taken as a positional, so secrets such as `-v` or `--x` are inserted verbatim.
//!
//! Exit behavior:
//! - wrong positional count: usage message, exit code 0
//! - success: `Row inserted successfully`, exit code 0
//! - parse, configuration, connection, or insert error: reported on stderr, non-zero exit
//!
//! Logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use aedemo::config::{resolve_config_with, Overrides};
use aedemo::engine::{engine_for, DatabaseType, ExecOptions};
use aedemo::logging::init_logging;
use aedemo::output::{render_error, render_outcome, OutputFormat};
use aedemo::{run, Target};

/// Insert one row into the column-encrypted table dbo.Table1
#[derive(Parser)]
#[command(name = "aedemo")]
#[command(about = "Insert one row into a column-encrypted SQL Server table")]
#[command(version)]
struct Cli {
    /// <id> <secretDeterministic> <secretRandomized>
    #[arg(value_name = "ARGS", num_args = 0.., allow_hyphen_values = true, trailing_var_arg = true)]
    args: Vec<String>,

    /// Config file to use instead of .aedemo/config.json and the user config
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Named connection from the config file
    #[arg(long, short = 'n')]
    name: Option<String>,

    /// Database engine (mssql, sqlite)
    #[arg(long, value_parser = parse_engine)]
    engine: Option<DatabaseType>,

    /// SQL Server host
    #[arg(long)]
    host: Option<String>,

    /// Initial catalog
    #[arg(long)]
    database: Option<String>,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Statement timeout in seconds (driver default when omitted)
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose logging on stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn parse_engine(s: &str) -> Result<DatabaseType, String> {
    s.parse().map_err(|e: aedemo::AeDemoError| e.message())
}

/// Resolve the config and engine for this invocation
///
/// The engine named by the resolved config is written to `resolved` before the
/// engine is looked up, so output is labelled even when that engine is not
/// compiled in.
fn resolve_target(
    cli: &Cli,
    lookup: impl Fn(&str) -> Option<String>,
    resolved: &mut Option<DatabaseType>,
) -> aedemo::Result<Target> {
    let overrides = Overrides {
        engine: cli.engine,
        host: cli.host.clone(),
        database: cli.database.clone(),
        file: cli.file.clone(),
    };
    let config =
        resolve_config_with(cli.config.as_deref(), cli.name.as_deref(), &overrides, lookup)?;
    *resolved = Some(config.engine);
    let engine = engine_for(config.engine)?;
    Ok(Target { config, engine })
}

fn engine_label(resolved: Option<DatabaseType>, requested: Option<DatabaseType>) -> String {
    resolved.or(requested).map(|e| e.to_string()).unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let opts = ExecOptions { timeout_secs: cli.timeout_secs };
    let mut resolved = None;

    let result = run(cli.args.as_slice(), &opts, || {
        resolve_target(&cli, |key| std::env::var(key).ok(), &mut resolved)
    });
    let engine = engine_label(resolved, cli.engine);

    match result {
        Ok(outcome) => {
            let rendered =
                render_outcome(cli.format, &engine, &outcome).context("Failed to render output")?;
            println!("{rendered}");
            Ok(())
        }
        Err(err) => {
            if let Some(rendered) =
                render_error(cli.format, &engine, &err).context("Failed to render output")?
            {
                println!("{rendered}");
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(argv.iter().copied()).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_hyphen_secrets_stay_positional() {
        let cli = parse(&["aedemo", "7", "-v", "x"]);
        assert_eq!(cli.args, vec!["7", "-v", "x"]);
        assert!(!cli.verbose);

        let cli = parse(&["aedemo", "7", "-abc", "--xyz"]);
        assert_eq!(cli.args, vec!["7", "-abc", "--xyz"]);

        let cli = parse(&["aedemo", "7", "-n", "x"]);
        assert_eq!(cli.args, vec!["7", "-n", "x"]);
        assert_eq!(cli.name, None);
    }

    #[test]
    fn test_options_before_positionals() {
        let cli = parse(&["aedemo", "--format", "json", "-v", "7", "a", "b"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert_eq!(cli.args, vec!["7", "a", "b"]);
    }

    #[test]
    fn test_negative_id_is_positional() {
        let cli = parse(&["aedemo", "-5", "a", "b"]);
        assert_eq!(cli.args, vec!["-5", "a", "b"]);
    }

    #[test]
    fn test_extra_words_reach_the_count_check() {
        let cli = parse(&["aedemo", "7", "a", "b", "--verbose"]);
        assert_eq!(cli.args.len(), 4);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_engine_label_follows_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"connections": {"local": {"engine": "sqlite", "file": "local.db"}}, "default": "local"}"#,
        )
        .unwrap();
        let config = path.to_str().unwrap();

        let cli = parse(&["aedemo", "--config", config, "7", "a", "b"]);
        let mut resolved = None;
        let _ = resolve_target(&cli, |_| None, &mut resolved);
        assert_eq!(resolved, Some(DatabaseType::SQLite));
        assert_eq!(engine_label(resolved, cli.engine), "sqlite");

        let cli = parse(&["aedemo", "--config", config, "--engine", "mssql", "7", "a", "b"]);
        let mut resolved = None;
        let _ = resolve_target(&cli, |_| None, &mut resolved);
        assert_eq!(engine_label(resolved, cli.engine), "mssql");
    }

    #[test]
    fn test_engine_label_before_resolution() {
        assert_eq!(engine_label(None, None), "");
        assert_eq!(engine_label(None, Some(DatabaseType::Mssql)), "mssql");
    }
}
