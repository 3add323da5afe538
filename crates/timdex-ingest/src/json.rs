//! Streaming reader for JSON Lines harvests.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::SourceRecord;
use crate::error::{IngestError, Result};

/// One JSON object from a JSON Lines file.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    pub value: Map<String, Value>,
    pub raw: Vec<u8>,
}

impl JsonRecord {
    /// String value of `key`, or `None` when absent, null, or not a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(Value::as_str)
    }

    /// Strings in the array at `key`. Non-string elements are ignored.
    pub fn str_list(&self, key: &str) -> Vec<String> {
        match self.value.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(value)) => vec![value.clone()],
            _ => Vec::new(),
        }
    }
}

impl SourceRecord for JsonRecord {
    fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Lazy iterator over the objects of a JSON Lines stream.
///
/// Blank lines are ignored. A line that does not parse as a JSON object
/// yields a recoverable error and reading continues with the next line.
pub struct JsonRecords<R: BufRead> {
    reader: R,
    line_number: usize,
    finished: bool,
}

impl JsonRecords<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestError::open(path, source))?;
        debug!(path = %path.display(), "opened JSON Lines source file");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonRecords<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            finished: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<JsonRecord>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(trimmed).map_err(|source| IngestError::Json {
                line: self.line_number,
                source,
                raw: trimmed.as_bytes().to_vec(),
            })?;
            let Value::Object(value) = value else {
                return Err(IngestError::NotAnObject {
                    line: self.line_number,
                    raw: trimmed.as_bytes().to_vec(),
                });
            };
            return Ok(Some(JsonRecord {
                value,
                raw: trimmed.as_bytes().to_vec(),
            }));
        }
    }
}

impl<R: BufRead> Iterator for JsonRecords<R> {
    type Item = Result<JsonRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                self.finished = !error.is_recoverable();
                Some(Err(error))
            }
        }
    }
}
