use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use polars::prelude::*;
use tracing::debug;

use timdex_transform::{DatasetRecord, RunContext};

use crate::error::OutputError;
use crate::{DEFAULT_BATCH_SIZE, DatasetWriter, WriteSummary, ensure_dir, partition_dir};

/// Writes one Parquet part file per batch of rows.
pub struct ParquetDatasetWriter {
    dir: PathBuf,
    run_id: String,
    batch_size: usize,
    buffer: Vec<DatasetRecord>,
    summary: WriteSummary,
    finished: bool,
}

impl ParquetDatasetWriter {
    pub fn create(output_dir: &Path, run: &RunContext) -> Result<Self, OutputError> {
        let dir = partition_dir(output_dir, run);
        ensure_dir(&dir)?;
        Ok(Self {
            dir,
            run_id: run.run_id.clone(),
            batch_size: DEFAULT_BATCH_SIZE,
            buffer: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            summary: WriteSummary::default(),
            finished: false,
        })
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn flush(&mut self) -> Result<(), OutputError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut frame = batch_frame(&self.buffer)?;
        let path = self
            .dir
            .join(format!("{}-{:04}.parquet", self.run_id, self.summary.files.len()));
        let file = File::create(&path).map_err(|source| OutputError::io(&path, source))?;
        ParquetWriter::new(file).finish(&mut frame)?;
        debug!(path = %path.display(), rows = self.buffer.len(), "wrote parquet part");

        self.summary.rows += self.buffer.len() as u64;
        self.summary.files.push(path);
        self.buffer.clear();
        Ok(())
    }
}

impl DatasetWriter for ParquetDatasetWriter {
    fn write(&mut self, row: DatasetRecord) -> Result<(), OutputError> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.buffer.push(row);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<WriteSummary, OutputError> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.flush()?;
        self.finished = true;
        Ok(std::mem::take(&mut self.summary))
    }
}

fn batch_frame(rows: &[DatasetRecord]) -> PolarsResult<DataFrame> {
    let timdex_record_id: Vec<Option<&str>> = rows
        .iter()
        .map(|row| row.timdex_record_id.as_deref())
        .collect();
    let source_record = BinaryChunked::from_iter_options(
        "source_record".into(),
        rows.iter().map(|row| Some(row.source_record.as_slice())),
    );
    let transformed_record = BinaryChunked::from_iter_options(
        "transformed_record".into(),
        rows.iter().map(|row| row.transformed_record.as_deref()),
    );
    let action: Vec<&str> = rows.iter().map(|row| row.action.as_str()).collect();
    let run_date: Vec<String> = rows
        .iter()
        .map(|row| row.run_date.format("%Y-%m-%d").to_string())
        .collect();
    let run_type: Vec<&str> = rows.iter().map(|row| row.run_type.as_str()).collect();
    let run_id: Vec<&str> = rows.iter().map(|row| row.run_id.as_str()).collect();
    let run_timestamp: Vec<String> = rows
        .iter()
        .map(|row| row.run_timestamp.to_rfc3339_opts(SecondsFormat::Secs, true))
        .collect();
    let run_record_offset: Vec<Option<u64>> =
        rows.iter().map(|row| row.run_record_offset).collect();
    let skip_reason: Vec<Option<String>> = rows
        .iter()
        .map(|row| row.skip_reason.as_ref().map(ToString::to_string))
        .collect();
    let error_message: Vec<Option<&str>> = rows
        .iter()
        .map(|row| row.error_message.as_deref())
        .collect();

    DataFrame::new(vec![
        Column::new("timdex_record_id".into(), timdex_record_id),
        source_record.into_series().into(),
        transformed_record.into_series().into(),
        Column::new("action".into(), action),
        Column::new("run_date".into(), run_date),
        Column::new("run_type".into(), run_type),
        Column::new("run_id".into(), run_id),
        Column::new("run_timestamp".into(), run_timestamp),
        Column::new("run_record_offset".into(), run_record_offset),
        Column::new("skip_reason".into(), skip_reason),
        Column::new("error_message".into(), error_message),
    ])
}
