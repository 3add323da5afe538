use std::path::PathBuf;

use timdex_ingest::IngestError;
use timdex_model::ValidationError;

/// Setup failures. These abort a run before any record is processed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("'{parameter}' parameter is required outside of test environments")]
    MissingParameter { parameter: String },

    #[error("source file name '{file_name}' does not follow the harvest file naming convention")]
    UnrecognizedFileName { file_name: String },

    #[error("invalid run type '{value}', expected one of: full, daily, incremental")]
    InvalidRunType { value: String },

    #[error("invalid run date '{value}': {source}")]
    InvalidRunDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("failed to read exclusion list {path}: {source}")]
    ExclusionList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl ConfigError {
    pub(crate) fn missing(parameter: &str) -> Self {
        Self::MissingParameter {
            parameter: parameter.to_string(),
        }
    }
}

/// Failures raised while extracting fields from one record.
///
/// `Skip` is the typed skip signal; every other variant becomes an
/// `error` row.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{reason}")]
    Skip {
        source_record_id: Option<String>,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExtractError {
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            source_record_id: None,
            reason: reason.into(),
        }
    }

    pub fn skip_record(source_record_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Skip {
            source_record_id: Some(source_record_id.into()),
            reason: reason.into(),
        }
    }
}

/// Failures that end a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("source stream failed after {processed} records: {source}")]
    Source {
        processed: u64,
        #[source]
        source: IngestError,
    },
}
