//! CLI module for stratify
//!
//! Provides command-line interface for:
//! - profile: Count rows per class level
//! - explain: Plan a balanced sample without writing
//! - balance: Plan and materialize a balanced sample

mod args;
mod commands;
mod errors;
mod io;

pub use args::{BalanceArgs, Cli, Command};
pub use commands::{balance, explain, profile, run, run_command, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
