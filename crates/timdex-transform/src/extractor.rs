//! The contract every format-specific extractor satisfies.

use std::sync::Arc;

use timdex_ingest::SourceRecord;
use timdex_model::OptionalFields;

use crate::context::RunContext;
use crate::error::ExtractError;

/// Registry values for the source being transformed, plus the run.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Short code, e.g. `libguides`. Prefix of every record id.
    pub code: String,
    /// Display name stored in each record's `source` field.
    pub name: String,
    pub base_url: String,
    pub run: Arc<RunContext>,
}

impl SourceContext {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
        run: RunContext,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            base_url: base_url.into(),
            run: Arc::new(run),
        }
    }
}

/// Result of optional-field extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Fields(OptionalFields),
    /// The record's content types are not accepted for this source.
    ContentTypeRejected { content_types: Vec<String> },
}

/// Format-specific field extraction.
///
/// Implementations must not depend on the pipeline; the pipeline only
/// depends on this trait. No method may mutate the record.
pub trait Extractor {
    type Record: SourceRecord;

    /// Candidate titles in source order. Empty means missing.
    fn main_titles(&self, record: &Self::Record) -> Vec<String>;

    /// Identifier unique within the source.
    fn source_record_id(&self, record: &Self::Record) -> Result<String, ExtractError>;

    fn record_is_deleted(&self, record: &Self::Record) -> bool;

    fn optional_fields(
        &self,
        source: &SourceContext,
        record: &Self::Record,
    ) -> Result<Extraction, ExtractError>;

    /// Defaults to `{base_url}{source_record_id}`.
    fn source_link(
        &self,
        source: &SourceContext,
        _record: &Self::Record,
        source_record_id: &str,
    ) -> Result<String, ExtractError> {
        Ok(format!("{}{source_record_id}", source.base_url))
    }

    /// Defaults to `{code}:{source_record_id}` with `/` replaced by `-`.
    fn timdex_record_id(
        &self,
        source: &SourceContext,
        _record: &Self::Record,
        source_record_id: &str,
    ) -> Result<String, ExtractError> {
        Ok(format!("{}:{}", source.code, source_record_id.replace('/', "-")))
    }

    /// Source-specific exclusion, checked alongside the exclusion list.
    fn record_is_excluded(&self, _source: &SourceContext, _record: &Self::Record) -> bool {
        false
    }
}
