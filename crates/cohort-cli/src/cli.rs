//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cohort",
    version,
    about = "Cohort comparison regressions with FDR-corrected significance",
    long_about = "Fit one OLS model per measurement column comparing cohort groups,\n\
                  correct the model p-values with Benjamini-Hochberg, and export\n\
                  the significant coefficients to CSV."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the regression analysis described by a configuration file.
    Analyze(AnalyzeArgs),

    /// List the measurement tables the configuration would analyse.
    Datasets(DatasetsArgs),
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Analysis configuration (JSON).
    #[arg(long = "config", value_name = "FILE")]
    pub config: PathBuf,

    /// Data release folder (overrides `data_dir`).
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Results CSV path (overrides `output`).
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Add a gender-by-group interaction term to every model.
    #[arg(long = "interaction")]
    pub interaction: bool,

    /// Run the analysis and report without writing the results file.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct DatasetsArgs {
    /// Analysis configuration (JSON).
    #[arg(long = "config", value_name = "FILE")]
    pub config: PathBuf,

    /// Data release folder (overrides `data_dir`).
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
