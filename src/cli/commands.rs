//! CLI command implementations
//!
//! Every command loads and validates the configuration, opens the database
//! and produces exactly one JSON response.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::balance::{
    BalanceContext, BalanceRequest, Balancer, ExplainPlan, DEFAULT_ID_COLUMN,
    DEFAULT_NULL_SENTINEL,
};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::store::SqliteStore;

use super::args::{BalanceArgs, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file (required)
    pub database_path: String,

    /// Name of the generated row identifier column
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Stand-in for null class values inside generated statements
    #[serde(default = "default_null_sentinel")]
    pub null_sentinel: String,

    /// Minimum log severity: trace, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_id_column() -> String {
    DEFAULT_ID_COLUMN.to_string()
}
fn default_null_sentinel() -> String {
    DEFAULT_NULL_SENTINEL.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        for (name, value) in [
            ("database_path", &self.database_path),
            ("id_column", &self.id_column),
            ("null_sentinel", &self.null_sentinel),
        ] {
            if value.trim().is_empty() {
                return Err(CliError::config_error(format!("{} must not be empty", name)));
            }
        }

        if self.id_column == self.null_sentinel {
            return Err(CliError::config_error(
                "id_column and null_sentinel must differ",
            ));
        }

        self.severity()?;

        Ok(())
    }

    pub fn database_path(&self) -> &Path {
        Path::new(&self.database_path)
    }

    /// Parsed log level; fatal is not a valid threshold
    pub fn severity(&self) -> CliResult<Severity> {
        match self.log_level.parse::<Severity>() {
            Ok(Severity::Fatal) | Err(_) => Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Use trace, info, warn or error.",
                self.log_level
            ))),
            Ok(severity) => Ok(severity),
        }
    }

    /// Planning context with a fresh scratch seed
    pub fn balance_context(&self, seed: u32) -> BalanceContext {
        BalanceContext {
            id_column: self.id_column.clone(),
            null_sentinel: self.null_sentinel.clone(),
            seed,
        }
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command. Failures are
/// also reported as a JSON error response.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command).inspect_err(|e| {
        let _ = write_error(e.code_str(), e.message());
    })
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let data = match cmd {
        Command::Profile {
            config,
            source,
            class_col,
            keep_null,
        } => profile(&config, &source, &class_col, keep_null)?,
        Command::Explain { config, balance } => explain(&config, &balance)?,
        Command::Balance { config, balance } => self::balance(&config, &balance)?,
    };
    write_response(data)
}

/// Per-level row counts of the class column
pub fn profile(
    config_path: &Path,
    source: &str,
    class_col: &str,
    keep_null: bool,
) -> CliResult<Value> {
    let (config, mut store) = open(config_path)?;
    let balancer = Balancer::new(&mut store, config.balance_context(rand::random()));

    let request = BalanceRequest::new(source, "", class_col).keep_null(keep_null);
    let frequencies = balancer.profile(&request)?;

    Ok(json!({
        "source_table": source,
        "class_col": class_col,
        "total": frequencies.total(),
        "levels": frequencies,
    }))
}

/// Plans a request without writing anything.
///
/// A rejected plan is still a response; it carries the rejection code.
pub fn explain(config_path: &Path, args: &BalanceArgs) -> CliResult<Value> {
    let (config, mut store) = open(config_path)?;
    let balancer = Balancer::new(&mut store, config.balance_context(rand::random()));

    let explain = match balancer.plan(&args.to_request()) {
        Ok(plan) => ExplainPlan::from_plan(&plan),
        Err(err) => ExplainPlan::from_error(&err),
    };
    Ok(serde_json::to_value(&explain)?)
}

/// Plans a request and materializes the output table
pub fn balance(config_path: &Path, args: &BalanceArgs) -> CliResult<Value> {
    let (config, mut store) = open(config_path)?;
    let mut balancer = Balancer::new(&mut store, config.balance_context(rand::random()));

    let outcome = balancer.run(&args.to_request())?;

    Ok(json!({
        "output_table": outcome.output_table,
        "rows_written": outcome.rows_written,
        "plan": ExplainPlan::from_plan(&outcome.plan),
    }))
}

/// Loads the configuration, applies the log level and opens the database
fn open(config_path: &Path) -> CliResult<(Config, SqliteStore)> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("database", config.database_path.as_str()),
            ("log_level", config.log_level.as_str()),
        ],
    );

    let store = SqliteStore::open(config.database_path())?;
    Ok((config, store))
}
