//! Dataset emission.
//!
//! Every pipeline row, whatever its action, becomes one dataset row with the
//! columns listed in [`COLUMNS`]. Files land under a partition directory
//! derived from the run date:
//!
//! ```text
//! {output}/year=2024/month=03/day=01/{run_id}-0000.parquet
//! ```

mod error;
mod jsonl;
mod parquet;

use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::Serialize;

use timdex_transform::{DatasetRecord, RunContext};

pub use error::OutputError;
pub use jsonl::JsonLinesWriter;
pub use parquet::ParquetDatasetWriter;

/// Rows buffered before a Parquet part file is written.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

pub const COLUMNS: [&str; 11] = [
    "timdex_record_id",
    "source_record",
    "transformed_record",
    "action",
    "run_date",
    "run_type",
    "run_id",
    "run_timestamp",
    "run_record_offset",
    "skip_reason",
    "error_message",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Parquet,
    JsonLines,
}

/// Files written and rows emitted by a finished writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows: u64,
    pub files: Vec<PathBuf>,
}

pub trait DatasetWriter {
    fn write(&mut self, row: DatasetRecord) -> Result<(), OutputError>;

    /// Flush buffered rows. The writer must not be used afterwards.
    fn finish(&mut self) -> Result<WriteSummary, OutputError>;
}

/// `{root}/year=YYYY/month=MM/day=DD`
pub fn partition_dir(root: &Path, run: &RunContext) -> PathBuf {
    root.join(format!("year={:04}", run.run_date.year()))
        .join(format!("month={:02}", run.run_date.month()))
        .join(format!("day={:02}", run.run_date.day()))
}

pub fn open_writer(
    format: OutputFormat,
    output_dir: &Path,
    run: &RunContext,
) -> Result<Box<dyn DatasetWriter>, OutputError> {
    Ok(match format {
        OutputFormat::Parquet => Box::new(ParquetDatasetWriter::create(output_dir, run)?),
        OutputFormat::JsonLines => Box::new(JsonLinesWriter::create(output_dir, run)?),
    })
}

pub(crate) fn ensure_dir(path: &Path) -> Result<(), OutputError> {
    std::fs::create_dir_all(path).map_err(|source| OutputError::io(path, source))
}
