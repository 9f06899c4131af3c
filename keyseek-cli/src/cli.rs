//! Command-line argument definitions.
//!
//! Commands:
//! - keyseek encode --sort <spec> --value <field=kind:text>...
//! - keyseek decode <token> [--sort <spec>]
//! - keyseek query --table <name> --sort <spec> [--cursor <token>] [--limit <n>]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::log::Level;

/// Keyset pagination tokens and page queries, from the command line
#[derive(Parser, Debug)]
#[command(name = "keyseek")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default: ./keyseek.toml if present)
    #[arg(long, global = true, env = "KEYSEEK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile from the configuration file supplying table, sort and fields
    #[arg(long, short, global = true)]
    pub profile: Option<String>,

    /// Override the configured log level
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<Level>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a continuation token from literal sort-key values
    Encode {
        /// Sort specification, e.g. "-created_at,id"
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,

        /// Cursor value as FIELD=KIND:TEXT (kinds: bool, int, dec, ts, text) or FIELD=null
        #[arg(long = "value", short = 'v', value_name = "FIELD=KIND:TEXT")]
        values: Vec<String>,
    },

    /// Decode a continuation token and print its keys as JSON
    Decode {
        /// The token to decode
        token: String,

        /// Reject the token unless it was issued for this sort specification
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,
    },

    /// Render the SQL for one page
    Query {
        /// Table to select from
        #[arg(long)]
        table: Option<String>,

        /// Sort specification, e.g. "-created_at,id"
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,

        /// Columns to select (comma separated; default all)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Continuation token from the previous page
        #[arg(long)]
        cursor: Option<String>,

        /// Page size (default from configuration)
        #[arg(long)]
        limit: Option<String>,

        /// SQL dialect (default from configuration)
        #[arg(long, value_enum)]
        dialect: Option<DialectName>,
    },
}

/// SQL dialect selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DialectName {
    #[default]
    Postgres,
    Sqlite,
}
