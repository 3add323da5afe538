//! CLI argument definitions for transmogrifier.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "transmogrifier",
    version,
    about = "Transform harvested source records into normalized TIMDEX records",
    long_about = "Transform harvested source records into normalized TIMDEX records.\n\n\
                  Every input record produces one dataset row with an action of \
                  index, delete, skip or error."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

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
    /// Transform one harvest file into a TIMDEX dataset.
    Transform(TransformArgs),

    /// List the sources in the registry.
    Sources(SourcesArgs),
}

#[derive(Parser)]
pub struct TransformArgs {
    /// Harvest file, e.g. libguides-2024-03-01-daily-extracted-records-to-index.xml.
    #[arg(short = 'i', long = "input-file", value_name = "FILE")]
    pub input_file: PathBuf,

    /// Dataset root directory. Rows are written under year=/month=/day= partitions.
    #[arg(short = 'o', long = "output-location", value_name = "DIR")]
    pub output_location: PathBuf,

    /// Source code (defaults to the prefix of the input file name).
    #[arg(short = 's', long = "source", value_name = "CODE")]
    pub source: Option<String>,

    /// Run identifier (a UUID is minted when omitted).
    #[arg(long = "run-id")]
    pub run_id: Option<String>,

    /// Run timestamp in RFC 3339 (defaults to midnight UTC of the run date).
    #[arg(long = "run-timestamp", value_parser = parse_timestamp)]
    pub run_timestamp: Option<DateTime<Utc>>,

    /// Run date as YYYY-MM-DD (defaults to the date in the input file name).
    #[arg(long = "run-date", value_name = "DATE")]
    pub run_date: Option<NaiveDate>,

    /// Run type (defaults to the type in the input file name).
    #[arg(long = "run-type", value_enum)]
    pub run_type: Option<RunTypeArg>,

    /// Newline-delimited source links to skip.
    #[arg(long = "exclusion-list", value_name = "PATH")]
    pub exclusion_list: Option<PathBuf>,

    /// Source registry TOML replacing the built-in registry.
    #[arg(long = "sources", value_name = "PATH")]
    pub sources: Option<PathBuf>,

    /// Dataset file format.
    #[arg(long = "format", value_enum, default_value = "parquet")]
    pub format: OutputFormatArg,
}

#[derive(Parser)]
pub struct SourcesArgs {
    /// Source registry TOML replacing the built-in registry.
    #[arg(long = "sources", value_name = "PATH")]
    pub sources: Option<PathBuf>,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| format!("expected an RFC 3339 timestamp: {error}"))
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RunTypeArg {
    Full,
    Daily,
    Incremental,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Parquet,
    Jsonl,
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
