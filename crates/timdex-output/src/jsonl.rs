use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::Value;

use timdex_transform::{DatasetRecord, RunContext};

use crate::error::OutputError;
use crate::{DatasetWriter, WriteSummary, ensure_dir, partition_dir};

/// One JSON object per row. The transformed record is embedded as JSON and
/// the source record as standard base64 of its exact bytes.
pub struct JsonLinesWriter {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    rows: u64,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    timdex_record_id: Option<&'a str>,
    source_record: String,
    transformed_record: Option<Value>,
    action: &'a str,
    run_date: String,
    run_type: &'a str,
    run_id: &'a str,
    run_timestamp: String,
    run_record_offset: Option<u64>,
    skip_reason: Option<String>,
    error_message: Option<&'a str>,
}

impl JsonLinesWriter {
    pub fn create(output_dir: &Path, run: &RunContext) -> Result<Self, OutputError> {
        let dir = partition_dir(output_dir, run);
        ensure_dir(&dir)?;
        let path = dir.join(format!("{}.jsonl", run.run_id));
        let file = File::create(&path).map_err(|source| OutputError::io(&path, source))?;
        Ok(Self {
            path,
            out: Some(BufWriter::new(file)),
            rows: 0,
        })
    }
}

impl DatasetWriter for JsonLinesWriter {
    fn write(&mut self, row: DatasetRecord) -> Result<(), OutputError> {
        let out = self.out.as_mut().ok_or(OutputError::Finished)?;
        let transformed_record = row
            .transformed_record
            .as_deref()
            .map(serde_json::from_slice::<Value>)
            .transpose()?;
        let line = JsonRow {
            timdex_record_id: row.timdex_record_id.as_deref(),
            source_record: STANDARD.encode(&row.source_record),
            transformed_record,
            action: row.action.as_str(),
            run_date: row.run_date.format("%Y-%m-%d").to_string(),
            run_type: row.run_type.as_str(),
            run_id: &row.run_id,
            run_timestamp: row.run_timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            run_record_offset: row.run_record_offset,
            skip_reason: row.skip_reason.as_ref().map(ToString::to_string),
            error_message: row.error_message.as_deref(),
        };
        serde_json::to_writer(&mut *out, &line)?;
        out.write_all(b"\n")
            .map_err(|source| OutputError::io(&self.path, source))?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<WriteSummary, OutputError> {
        let mut out = self.out.take().ok_or(OutputError::Finished)?;
        out.flush()
            .map_err(|source| OutputError::io(&self.path, source))?;
        Ok(WriteSummary {
            rows: self.rows,
            files: vec![self.path.clone()],
        })
    }
}
