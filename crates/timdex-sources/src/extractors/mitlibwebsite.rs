use chrono::SecondsFormat;
use md5::{Digest, Md5};

use timdex_ingest::JsonRecord;
use timdex_model::{Contributor, Date, Link, OptionalFields};
use timdex_transform::{ExtractError, Extraction, Extractor, SourceContext};

/// Crawled pages of the MIT Libraries website, one JSON object per page.
///
/// Expected keys: `url`, `cdx_title`, and optionally `og_description`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MitLibWebsite;

impl MitLibWebsite {
    fn url(record: &JsonRecord) -> Result<&str, ExtractError> {
        record
            .str_field("url")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ExtractError::skip("Record skipped because 'url' is missing or blank."))
    }
}

impl Extractor for MitLibWebsite {
    type Record = JsonRecord;

    fn main_titles(&self, record: &JsonRecord) -> Vec<String> {
        record.str_field("cdx_title").map(str::to_string).into_iter().collect()
    }

    /// MD5 of the page URL, hex encoded.
    fn source_record_id(&self, record: &JsonRecord) -> Result<String, ExtractError> {
        Ok(hex::encode(Md5::digest(Self::url(record)?.as_bytes())))
    }

    fn record_is_deleted(&self, _record: &JsonRecord) -> bool {
        false
    }

    fn source_link(
        &self,
        _source: &SourceContext,
        record: &JsonRecord,
        _source_record_id: &str,
    ) -> Result<String, ExtractError> {
        Self::url(record).map(str::to_string)
    }

    fn timdex_record_id(
        &self,
        source: &SourceContext,
        _record: &JsonRecord,
        source_record_id: &str,
    ) -> Result<String, ExtractError> {
        Ok(format!("{}:{source_record_id}", source.code))
    }

    fn optional_fields(
        &self,
        source: &SourceContext,
        record: &JsonRecord,
    ) -> Result<Extraction, ExtractError> {
        let url = Self::url(record)?;
        let accessed = source
            .run
            .run_timestamp
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        Ok(Extraction::Fields(OptionalFields {
            content_type: Some(vec!["Website".to_string()]),
            contributors: Some(vec![Contributor {
                mit_affiliated: Some(true),
                ..Contributor::new("MIT Libraries", Some("Creator"))
            }]),
            dates: Some(vec![Date::new(accessed, Some("Accessed"))]),
            format: Some("electronic resource".to_string()),
            links: Some(vec![Link::new(url, Some("Website"))]),
            summary: record
                .str_field("og_description")
                .filter(|description| !description.trim().is_empty())
                .map(|description| vec![description.to_string()]),
            ..OptionalFields::default()
        }))
    }
}
