//! Per-record output rows.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::context::RunType;

/// Classification of one source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Index,
    Delete,
    Skip,
    Error,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Delete => "delete",
            Self::Skip => "skip",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Source link on the exclusion list, or excluded by the extractor.
    Excluded,
    ContentTypeRejected,
    /// Skip signal raised by the extractor.
    Signal(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded => f.write_str("excluded"),
            Self::ContentTypeRejected => f.write_str("content type rejected"),
            Self::Signal(reason) => f.write_str(reason),
        }
    }
}

/// One output row handed to the dataset writer.
///
/// `transformed_record` and `run_record_offset` are set only for
/// [`Action::Index`]. `source_record` is retained for every action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    pub timdex_record_id: Option<String>,
    pub source_record: Vec<u8>,
    pub transformed_record: Option<Vec<u8>>,
    pub action: Action,
    pub run_date: NaiveDate,
    pub run_type: RunType,
    pub run_id: String,
    pub run_timestamp: DateTime<Utc>,
    pub run_record_offset: Option<u64>,
    pub skip_reason: Option<SkipReason>,
    pub error_message: Option<String>,
}
