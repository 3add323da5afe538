//! The transformation state machine.
//!
//! Each pulled record moves from pending to exactly one terminal state:
//!
//! | Condition                          | Action  |
//! |------------------------------------|---------|
//! | extractor flags deleted            | delete  |
//! | source link excluded               | skip    |
//! | content type rejected              | skip    |
//! | skip signal raised                 | skip    |
//! | any other extraction failure       | error   |
//! | source record could not be parsed  | error   |
//! | otherwise                          | index   |
//!
//! Record-level failures never escape the iterator. Only a failure of the
//! source stream itself is returned as `Err`, after which the iterator ends.

use serde::Serialize;
use tracing::{debug, info, warn};

use timdex_ingest::{IngestError, SourceRecord};
use timdex_model::{NormalizedRecord, RequiredFields, TITLE_NOT_PROVIDED};

use crate::context::RunContext;
use crate::derive::generate_derived_fields;
use crate::error::{ExtractError, TransformError};
use crate::exclusions::ExclusionList;
use crate::extractor::{Extraction, Extractor, SourceContext};
use crate::outcome::{Action, DatasetRecord, SkipReason};

/// Per-run counters. `processed` always equals the sum of the others once
/// a record has been emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub processed: u64,
    pub indexed: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub errored: u64,
}

impl TransformStats {
    pub fn classified(&self) -> u64 {
        self.indexed + self.deleted + self.skipped + self.errored
    }
}

enum Classified {
    Indexed(Box<NormalizedRecord>),
    Deleted,
    Skipped(SkipReason),
    Errored(String),
}

/// Iterator turning raw source records into [`DatasetRecord`] rows.
pub struct Transformer<E, I> {
    extractor: E,
    source: SourceContext,
    records: I,
    exclusions: ExclusionList,
    stats: TransformStats,
    next_offset: u64,
    finished: bool,
}

impl<E, I> Transformer<E, I>
where
    E: Extractor,
    I: Iterator<Item = Result<E::Record, IngestError>>,
{
    pub fn new(extractor: E, source: SourceContext, records: I) -> Self {
        Self {
            extractor,
            source,
            records,
            exclusions: ExclusionList::default(),
            stats: TransformStats::default(),
            next_offset: 0,
            finished: false,
        }
    }

    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionList) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn stats(&self) -> &TransformStats {
        &self.stats
    }

    pub fn source(&self) -> &SourceContext {
        &self.source
    }

    pub fn run(&self) -> &RunContext {
        &self.source.run
    }

    /// Give back the extractor together with the final counters.
    pub fn into_parts(self) -> (E, TransformStats) {
        (self.extractor, self.stats)
    }

    fn classify(&self, record: &E::Record) -> (Option<String>, Classified) {
        let mut timdex_record_id = None;
        let classified = match self.transform(record, &mut timdex_record_id) {
            Ok(classified) => classified,
            Err(ExtractError::Skip {
                source_record_id,
                reason,
            }) => {
                warn!(
                    source_record_id = source_record_id.as_deref().unwrap_or_default(),
                    reason = %reason,
                    "record skipped"
                );
                Classified::Skipped(SkipReason::Signal(reason))
            }
            Err(error) => {
                let message = error.to_string();
                warn!(
                    timdex_record_id = timdex_record_id.as_deref().unwrap_or_default(),
                    "Unhandled exception during record transformation: {message}"
                );
                Classified::Errored(message)
            }
        };
        (timdex_record_id, classified)
    }

    fn transform(
        &self,
        record: &E::Record,
        timdex_record_id: &mut Option<String>,
    ) -> Result<Classified, ExtractError> {
        if self.extractor.record_is_deleted(record) {
            let source_record_id = self.extractor.source_record_id(record)?;
            let id = self
                .extractor
                .timdex_record_id(&self.source, record, &source_record_id)?;
            debug!(timdex_record_id = %id, "record flagged deleted");
            *timdex_record_id = Some(id);
            return Ok(Classified::Deleted);
        }

        let source_record_id = self.extractor.source_record_id(record)?;
        let id = self
            .extractor
            .timdex_record_id(&self.source, record, &source_record_id)?;
        *timdex_record_id = Some(id.clone());
        let source_link = self
            .extractor
            .source_link(&self.source, record, &source_record_id)?;

        if self.exclusions.contains(&source_link)
            || self.extractor.record_is_excluded(&self.source, record)
        {
            debug!(timdex_record_id = %id, source_link = %source_link, "record excluded");
            return Ok(Classified::Skipped(SkipReason::Excluded));
        }

        let title = self.title(record, &source_record_id);

        let mut fields = match self.extractor.optional_fields(&self.source, record)? {
            Extraction::Fields(fields) => fields,
            Extraction::ContentTypeRejected { content_types } => {
                debug!(
                    timdex_record_id = %id,
                    content_types = ?content_types,
                    "record skipped based on content type"
                );
                return Ok(Classified::Skipped(SkipReason::ContentTypeRejected));
            }
        };
        generate_derived_fields(&title, &source_link, &id, &mut fields);

        let record = NormalizedRecord::new(
            RequiredFields {
                source: self.source.name.clone(),
                source_link,
                timdex_record_id: id,
                title,
            },
            fields,
        )?;
        Ok(Classified::Indexed(Box::new(record)))
    }

    fn title(&self, record: &E::Record, source_record_id: &str) -> String {
        let titles: Vec<String> = self
            .extractor
            .main_titles(record)
            .into_iter()
            .filter(|title| !title.trim().is_empty())
            .collect();
        match titles.as_slice() {
            [] => {
                warn!(
                    source_record_id,
                    "Record {source_record_id} was missing a title, source record should be investigated."
                );
                TITLE_NOT_PROVIDED.to_string()
            }
            [title] => title.clone(),
            [first, ..] => {
                warn!(
                    source_record_id,
                    "Record {source_record_id} has multiple titles. Using the first title from the following titles found: {titles:?}"
                );
                first.clone()
            }
        }
    }

    fn emit(
        &mut self,
        source_record: Vec<u8>,
        timdex_record_id: Option<String>,
        classified: Classified,
    ) -> DatasetRecord {
        let run = &self.source.run;
        let mut row = DatasetRecord {
            timdex_record_id,
            source_record,
            transformed_record: None,
            action: Action::Error,
            run_date: run.run_date,
            run_type: run.run_type,
            run_id: run.run_id.clone(),
            run_timestamp: run.run_timestamp,
            run_record_offset: None,
            skip_reason: None,
            error_message: None,
        };

        match classified {
            Classified::Indexed(record) => {
                let offset = self.next_offset;
                let serialized = record
                    .to_canonical_map_with_provenance(&run.provenance(offset))
                    .and_then(|map| serde_json::to_vec(&map));
                match serialized {
                    Ok(bytes) => {
                        self.next_offset += 1;
                        row.action = Action::Index;
                        row.transformed_record = Some(bytes);
                        row.run_record_offset = Some(offset);
                        self.stats.indexed += 1;
                    }
                    Err(error) => mark_errored(&mut row, &mut self.stats, error.to_string()),
                }
            }
            Classified::Deleted => {
                row.action = Action::Delete;
                self.stats.deleted += 1;
            }
            Classified::Skipped(reason) => {
                row.action = Action::Skip;
                row.skip_reason = Some(reason);
                self.stats.skipped += 1;
            }
            Classified::Errored(message) => mark_errored(&mut row, &mut self.stats, message),
        }
        row
    }
}

fn mark_errored(row: &mut DatasetRecord, stats: &mut TransformStats, message: String) {
    row.action = Action::Error;
    row.error_message = Some(message);
    stats.errored += 1;
}

impl<E, I> Iterator for Transformer<E, I>
where
    E: Extractor,
    I: Iterator<Item = Result<E::Record, IngestError>>,
{
    type Item = Result<DatasetRecord, TransformError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let record = match self.records.next() {
            Some(Ok(record)) => record,
            Some(Err(source)) if source.is_recoverable() => {
                self.stats.processed += 1;
                let message = source.to_string();
                warn!("Unparseable source record: {message}");
                let raw = source.record_bytes().unwrap_or_default().to_vec();
                return Some(Ok(self.emit(raw, None, Classified::Errored(message))));
            }
            Some(Err(source)) => {
                self.finished = true;
                return Some(Err(TransformError::Source {
                    processed: self.stats.processed,
                    source,
                }));
            }
            None => {
                self.finished = true;
                info!(
                    processed = self.stats.processed,
                    indexed = self.stats.indexed,
                    deleted = self.stats.deleted,
                    skipped = self.stats.skipped,
                    errored = self.stats.errored,
                    "source records exhausted"
                );
                return None;
            }
        };
        self.stats.processed += 1;
        let (timdex_record_id, classified) = self.classify(&record);
        Some(Ok(self.emit(
            record.raw_bytes().to_vec(),
            timdex_record_id,
            classified,
        )))
    }
}
