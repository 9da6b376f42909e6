//! CLI argument parsing for eggtimer

use crate::config::DefinitionSpec;
use crate::segmenter::MatchPolicy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the segment report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// `--policy` values, mapped onto [`MatchPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Apply every matching definition
    All,
    /// Apply only the first matching definition
    First,
}

impl From<PolicyArg> for MatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::All => MatchPolicy::All,
            PolicyArg::First => MatchPolicy::First,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "eggtimer")]
#[command(version)]
#[command(
    about = "Time the phases a program announces on stdout/stderr",
    long_about = None
)]
pub struct Cli {
    /// Define a segment type: name, start regex, finish regex (repeatable)
    ///
    /// Each regex needs exactly one capture group for the instance tag.
    #[arg(
        short = 'd',
        long = "define",
        num_args = 3,
        value_names = ["TYPE", "START", "FINISH"]
    )]
    pub define: Vec<String>,

    /// TOML file with [[segment]] definitions
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How to treat a line matched by several definitions (overrides config)
    #[arg(long = "policy", value_enum)]
    pub policy: Option<PolicyArg>,

    /// Report format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Echo every captured line to stderr with its timestamp
    #[arg(long = "echo")]
    pub echo: bool,

    /// Enable debug tracing on stderr
    #[arg(long = "debug")]
    pub debug: bool,

    /// Command to time (everything after --)
    #[arg(last = true)]
    pub command: Option<Vec<String>>,
}

impl Cli {
    /// Definitions given with `-d`, in command-line order
    pub fn definitions(&self) -> Vec<DefinitionSpec> {
        self.define
            .chunks_exact(3)
            .map(|c| DefinitionSpec::new(c[0].as_str(), c[1].as_str(), c[2].as_str()))
            .collect()
    }
}
