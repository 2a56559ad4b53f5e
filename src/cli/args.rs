//! CLI argument definitions using clap
//!
//! Commands:
//! - stratify profile --config <path> --source <table> --class-col <col>
//! - stratify explain --config <path> <balance args>
//! - stratify balance --config <path> <balance args>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::balance::BalanceRequest;

/// stratify - stratified resampling of relational tables
#[derive(Parser, Debug)]
#[command(name = "stratify")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count rows per level of the class column
    Profile {
        /// Path to configuration file
        #[arg(long, default_value = "./stratify.json")]
        config: PathBuf,

        /// Source table
        #[arg(long)]
        source: String,

        /// Class column
        #[arg(long)]
        class_col: String,

        /// Report null class values as their own level
        #[arg(long)]
        keep_null: bool,
    },

    /// Plan a balanced sample without writing anything
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = "./stratify.json")]
        config: PathBuf,

        #[command(flatten)]
        balance: BalanceArgs,
    },

    /// Plan a balanced sample and write it to the output table
    Balance {
        /// Path to configuration file
        #[arg(long, default_value = "./stratify.json")]
        config: PathBuf,

        #[command(flatten)]
        balance: BalanceArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct BalanceArgs {
    /// Source table
    #[arg(long)]
    pub source: String,

    /// Output table; must not exist
    #[arg(long)]
    pub output: String,

    /// Class column
    #[arg(long)]
    pub class_col: String,

    /// Strategy (uniform, undersample, oversample or a prefix of at least
    /// 3 characters) or an explicit list such as "a=10, 'b c'=20"
    #[arg(long, default_value = "")]
    pub spec: String,

    /// Total output size goal
    #[arg(long, allow_hyphen_values = true)]
    pub output_size: Option<i64>,

    /// Not supported; rejected when given
    #[arg(long)]
    pub grouping_cols: Option<String>,

    /// Draw undersampled levels with replacement too
    #[arg(long)]
    pub with_replacement: bool,

    /// Treat null class values as their own level
    #[arg(long)]
    pub keep_null: bool,
}

impl BalanceArgs {
    pub fn to_request(&self) -> BalanceRequest {
        let mut request = BalanceRequest::new(&self.source, &self.output, &self.class_col)
            .with_class_size(&self.spec)
            .with_replacement(self.with_replacement)
            .keep_null(self.keep_null);
        if let Some(size) = self.output_size {
            request = request.with_output_size(size);
        }
        if let Some(cols) = &self.grouping_cols {
            request = request.with_grouping_cols(cols);
        }
        request
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
