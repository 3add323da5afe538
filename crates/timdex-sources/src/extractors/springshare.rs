use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use timdex_ingest::XmlRecord;
use timdex_model::{Date, Link};
use timdex_transform::dates::validate_date;
use timdex_transform::{ExtractError, Extraction, Extractor, SourceContext};

use super::oaidc::OaiDc;

/// OAI-DC as published by Springshare (LibGuides, research databases).
///
/// The first `dc:identifier` is the public URL of the guide or database and
/// is used as the source link.
#[derive(Debug, Clone, Default)]
pub struct SpringshareOaiDc {
    inner: OaiDc,
}

impl SpringshareOaiDc {
    pub fn new() -> Self {
        Self::default()
    }

    fn public_url(record: &XmlRecord) -> Option<String> {
        OaiDc::dc_values(record, "dc:identifier").into_iter().next()
    }

    fn created_date(record: &XmlRecord, source_record_id: &str) -> Option<Date> {
        let raw = OaiDc::dc_values(record, "dc:date").into_iter().next()?;
        let parsed = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map(|date| date.and_time(NaiveTime::MIN))
            });
        let Ok(parsed) = parsed else {
            debug!(source_record_id, date = %raw, "could not parse Springshare date");
            return None;
        };
        let iso = parsed.format("%Y-%m-%dT%H:%M:%S").to_string();
        validate_date(&iso, source_record_id).then(|| Date::new(iso, Some("Created")))
    }
}

impl Extractor for SpringshareOaiDc {
    type Record = XmlRecord;

    fn main_titles(&self, record: &XmlRecord) -> Vec<String> {
        self.inner.main_titles(record)
    }

    fn source_record_id(&self, record: &XmlRecord) -> Result<String, ExtractError> {
        self.inner.source_record_id(record)
    }

    fn record_is_deleted(&self, record: &XmlRecord) -> bool {
        self.inner.record_is_deleted(record)
    }

    fn source_link(
        &self,
        _source: &SourceContext,
        record: &XmlRecord,
        source_record_id: &str,
    ) -> Result<String, ExtractError> {
        Self::public_url(record).ok_or_else(|| {
            ExtractError::skip_record(
                source_record_id,
                "Record skipped because 'source_link' could not be derived. \
                 The 'dc:identifier' element was either missing or blank.",
            )
        })
    }

    fn optional_fields(
        &self,
        source: &SourceContext,
        record: &XmlRecord,
    ) -> Result<Extraction, ExtractError> {
        let source_record_id = self.source_record_id(record)?;
        let mut fields = match self.inner.optional_fields(source, record)? {
            Extraction::Fields(fields) => fields,
            rejected @ Extraction::ContentTypeRejected { .. } => return Ok(rejected),
        };

        fields.dates = Self::created_date(record, &source_record_id).map(|date| vec![date]);

        // "LibGuides" -> "LibGuide URL"
        let label = format!("{} URL", source.name.trim_end_matches('s'));
        fields.links = Self::public_url(record).map(|url| {
            vec![Link {
                url,
                kind: Some(label.clone()),
                restrictions: None,
                text: Some(label),
            }]
        });

        Ok(Extraction::Fields(fields))
    }
}
