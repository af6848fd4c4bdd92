//! Configuration Management
//!
//! This module resolves the `ConnectionConfig` used for the insert.
//!
//! # Configuration Locations
//! - Explicit: `--config <PATH>`
//! - Local: `.aedemo/config.json` (team-shareable, per-project)
//! - Global: `~/.config/aedemo/config.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Command-line overrides (highest priority)
//! 2. `AEDEMO_*` environment variables
//! 3. Config file: explicit path, otherwise local merged over global
//! 4. Built-in default (`localhost`, `AEDemo`, integrated security, column encryption on)
//!
//! # Named Connections
//! A config file stores named connections (e.g. "local", "staging") and a
//! default pointer:
//! ```json
//! {
//!   "connections": {
//!     "local": { "host": "localhost", "database": "AEDemo" },
//!     "staging": {
//!       "host": "sql-stg01",
//!       "database": "AEDemo",
//!       "auth": { "mode": "sql_login", "user": "aedemo" },
//!       "password_env": "AEDEMO_STAGING_PASSWORD"
//!     }
//!   },
//!   "default": "local"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::{AuthMode, ConnectionConfig, DatabaseType};
use crate::error::{AeDemoError, Result};

/// Config file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Named connections
    #[serde(default)]
    pub connections: HashMap<String, StoredConnection>,

    /// Name of the default connection (must exist in connections map)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Stored connection configuration
///
/// Wraps `ConnectionConfig` with an environment variable reference for the
/// password so config files never need to hold secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConnection {
    /// Connection configuration
    #[serde(flatten)]
    pub config: ConnectionConfig,

    /// Environment variable name for password (if not storing password directly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl StoredConnection {
    /// Fill in the `password_env` password and return a `ConnectionConfig`
    fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<ConnectionConfig> {
        let mut config = self.config.clone();

        if let Some(env_var) = &self.password_env {
            let password = lookup(env_var).ok_or_else(|| {
                AeDemoError::config_error(format!(
                    "Environment variable {env_var} not found for password"
                ))
            })?;
            set_password(&mut config, password)?;
        }

        Ok(config)
    }
}

/// Values supplied on the command line, applied last
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub engine: Option<DatabaseType>,
    pub host: Option<String>,
    pub database: Option<String>,
    pub file: Option<PathBuf>,
}

impl Overrides {
    /// Apply the overrides onto a config
    pub fn apply(&self, config: &mut ConnectionConfig) {
        if let Some(engine) = self.engine {
            config.engine = engine;
        }
        if let Some(host) = &self.host {
            config.host = Some(host.clone());
        }
        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        if let Some(file) = &self.file {
            config.file = Some(file.clone());
        }
    }
}

/// Get path to local config file (`.aedemo/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        AeDemoError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".aedemo").join("config.json"))
}

/// Get path to global config file (`~/.config/aedemo/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AeDemoError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("aedemo").join("config.json"))
}

/// Load a config file; a missing file yields an empty config
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| AeDemoError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents)
        .map_err(|e| AeDemoError::config_error(format!("Invalid config file format: {e}")))
}

/// Merge `local` over `global`: connections by name, default pointer if set
#[must_use]
pub fn merge(global: ConfigFile, local: ConfigFile) -> ConfigFile {
    let mut merged = global;
    merged.connections.extend(local.connections);
    if local.default.is_some() {
        merged.default = local.default;
    }
    merged
}

/// Load local and global config files with local taking precedence
pub fn load_with_precedence() -> Result<ConfigFile> {
    let global = load_config_file(&global_config_path()?)?;
    let local = load_config_file(&local_config_path()?)?;
    Ok(merge(global, local))
}

/// Pick a connection out of a config file
///
/// An explicit name must exist. Without a name the file's default is used, and
/// a file with neither a default nor any connection falls back to the
/// built-in default connection.
pub fn select_connection(file: &ConfigFile, name: Option<&str>) -> Result<Option<StoredConnection>> {
    let conn_name = match name.or(file.default.as_deref()) {
        Some(n) => n,
        None if file.connections.is_empty() => return Ok(None),
        None => {
            let mut available: Vec<_> = file.connections.keys().collect();
            available.sort();
            return Err(AeDemoError::config_error(format!(
                "No default connection set. Available connections: {available:?}. \
                 Specify one with --name or set a default in the config."
            )));
        }
    };

    file.connections.get(conn_name).cloned().map(Some).ok_or_else(|| {
        let mut available: Vec<_> = file.connections.keys().collect();
        available.sort();
        AeDemoError::config_error(format!(
            "Connection '{conn_name}' not found. Available connections: {available:?}"
        ))
    })
}

/// Apply `AEDEMO_*` variables read through `lookup`
pub fn apply_env_overrides(
    config: &mut ConnectionConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(engine) = lookup("AEDEMO_ENGINE") {
        config.engine = engine.parse()?;
    }
    if let Some(host) = lookup("AEDEMO_HOST") {
        config.host = Some(host);
    }
    if let Some(database) = lookup("AEDEMO_DATABASE") {
        config.database = Some(database);
    }
    if let Some(driver) = lookup("AEDEMO_DRIVER") {
        config.driver = Some(driver);
    }
    if let Some(file) = lookup("AEDEMO_SQLITE_FILE") {
        config.file = Some(PathBuf::from(file));
    }
    if let Some(flag) = lookup("AEDEMO_COLUMN_ENCRYPTION") {
        config.column_encryption = parse_flag("AEDEMO_COLUMN_ENCRYPTION", &flag)?;
    }
    if let Some(flag) = lookup("AEDEMO_TRUST_SERVER_CERTIFICATE") {
        config.trust_server_certificate = parse_flag("AEDEMO_TRUST_SERVER_CERTIFICATE", &flag)?;
    }
    if let Some(user) = lookup("AEDEMO_USER") {
        let password = match &config.auth {
            AuthMode::SqlLogin { password, .. } => password.clone(),
            AuthMode::Integrated => None,
        };
        config.auth = AuthMode::SqlLogin { user, password };
    }
    if let Some(password) = lookup("AEDEMO_PASSWORD") {
        set_password(config, password)?;
    }
    Ok(())
}

/// Resolve the effective connection config from the process environment
///
/// `explicit` replaces the local/global lookup when given.
pub fn resolve_config(
    explicit: Option<&Path>,
    name: Option<&str>,
    overrides: &Overrides,
) -> Result<ConnectionConfig> {
    resolve_config_with(explicit, name, overrides, |key| std::env::var(key).ok())
}

/// Resolve the effective connection config, reading variables through `lookup`
///
/// `lookup` serves both `password_env` references and `AEDEMO_*` overrides.
pub fn resolve_config_with(
    explicit: Option<&Path>,
    name: Option<&str>,
    overrides: &Overrides,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConnectionConfig> {
    let file = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(AeDemoError::config_error(format!(
                    "Config file {} does not exist",
                    path.display()
                )));
            }
            load_config_file(path)?
        }
        None => load_with_precedence()?,
    };

    let mut config = match select_connection(&file, name)? {
        Some(stored) => stored.resolve_with(&lookup)?,
        None => {
            debug!("no stored connection, using built-in default");
            ConnectionConfig::default()
        }
    };

    apply_env_overrides(&mut config, &lookup)?;
    overrides.apply(&mut config);

    debug!(target = %config.describe(), "connection resolved");
    Ok(config)
}

fn set_password(config: &mut ConnectionConfig, value: String) -> Result<()> {
    match &mut config.auth {
        AuthMode::SqlLogin { password, .. } => {
            *password = Some(value);
            Ok(())
        }
        AuthMode::Integrated => Err(AeDemoError::config_error(
            "A password was supplied but the connection uses integrated security",
        )),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Ok(true),
        "0" | "false" | "no" | "off" | "disabled" => Ok(false),
        other => Err(AeDemoError::config_error(format!("{key} has unrecognized value '{other}'"))),
    }
}
