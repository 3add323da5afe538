//! OpenGeoMetadata Aardvark records as curated for MIT's geodata portal.

use std::collections::HashSet;

use anyhow::anyhow;
use serde_json::Value;
use tracing::warn;

use timdex_ingest::JsonRecord;
use timdex_model::{
    AlternateTitle, Contributor, Date, DateRange, Identifier, Link, Location, Note,
    OptionalFields, Publisher, Rights, Subject,
};
use timdex_transform::{ExtractError, Extraction, Extractor, SourceContext};

use super::non_empty;

const DOWNLOAD_URL_KEY: &str = "https://schema.org/downloadUrl";

#[derive(Debug, Clone, Copy, Default)]
pub struct MitAardvark;

impl MitAardvark {
    fn dates(record: &JsonRecord) -> Result<Vec<Date>, ExtractError> {
        let mut dates = Vec::new();
        if let Some(issued) = record.str_field("dct_issued_s") {
            dates.push(Date::new(issued, Some("Issued")));
        }

        let mut coverage = record.str_list("dct_temporal_sm");
        if let Some(Value::Array(years)) = record.value.get("gbl_indexYear_im") {
            coverage.extend(years.iter().filter_map(Value::as_i64).map(|year| year.to_string()));
        }
        let mut seen = HashSet::new();
        coverage.retain(|value| seen.insert(value.clone()));
        dates.extend(coverage.into_iter().map(|value| Date::new(value, Some("Coverage"))));

        for range in record.str_list("gbl_dateRange_drsim") {
            let (gte, lte) = parse_solr_range(&range).ok_or_else(|| {
                ExtractError::Other(anyhow!("Invalid Solr date range: '{range}'"))
            })?;
            dates.push(Date::range(DateRange::inclusive(gte, lte), None));
        }
        Ok(dates)
    }

    fn links(record: &JsonRecord, source_record_id: &str) -> Vec<Link> {
        let Some(references) = record.str_field("dct_references_s") else {
            return Vec::new();
        };
        let parsed: Value = match serde_json::from_str(references) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(source_record_id, %error, "unable to parse dct_references_s");
                return Vec::new();
            }
        };
        parsed
            .get(DOWNLOAD_URL_KEY)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|download| {
                let url = download.get("url")?.as_str()?;
                Some(Link {
                    text: download
                        .get("label")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    ..Link::new(url, Some("Download"))
                })
            })
            .collect()
    }

    fn locations(record: &JsonRecord) -> Vec<Location> {
        [("dcat_bbox", "Bounding Box"), ("locn_geometry", "Geometry")]
            .into_iter()
            .filter_map(|(key, kind)| {
                record.str_field(key).map(|shape| Location {
                    value: None,
                    kind: Some(kind.to_string()),
                    geoshape: Some(shape.to_string()),
                })
            })
            .collect()
    }

    fn rights(record: &JsonRecord) -> Vec<Rights> {
        let mut rights = Vec::new();
        if let Some(access) = record.str_field("dct_accessRights_s") {
            rights.push(Rights {
                description: Some(access.to_string()),
                kind: Some("Access".to_string()),
                uri: None,
            });
        }
        rights.extend(record.str_list("dct_license_sm").into_iter().map(|license| Rights {
            uri: Some(license),
            ..Rights::default()
        }));
        let mut statements = record.str_list("dct_rights_sm");
        statements.extend(record.str_list("dct_rightsHolder_sm"));
        if !statements.is_empty() {
            rights.push(Rights {
                description: Some(statements.join(". ")),
                ..Rights::default()
            });
        }
        rights
    }

    fn subjects(record: &JsonRecord) -> Vec<Subject> {
        [
            ("dcat_keyword_sm", "DCAT Keyword"),
            ("dcat_theme_sm", "DCAT Theme"),
            ("dct_subject_sm", "Dublin Core Subject"),
            ("gbl_resourceClass_sm", "Subject scheme not provided"),
            ("gbl_resourceType_sm", "Subject scheme not provided"),
        ]
        .into_iter()
        .flat_map(|(key, kind)| {
            record
                .str_list(key)
                .into_iter()
                .map(move |value| Subject::new(vec![value], Some(kind)))
        })
        .collect()
    }
}

/// `[1943 TO 1946]` -> `("1943", "1946")`.
fn parse_solr_range(range: &str) -> Option<(&str, &str)> {
    let inner = range.trim().strip_prefix('[')?.strip_suffix(']')?;
    let (start, end) = inner.split_once(" TO ")?;
    let (start, end) = (start.trim(), end.trim());
    (!start.is_empty() && !end.is_empty()).then_some((start, end))
}

impl Extractor for MitAardvark {
    type Record = JsonRecord;

    fn main_titles(&self, record: &JsonRecord) -> Vec<String> {
        record.str_field("dct_title_s").map(str::to_string).into_iter().collect()
    }

    fn source_record_id(&self, record: &JsonRecord) -> Result<String, ExtractError> {
        record
            .str_field("id")
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| ExtractError::skip("Record skipped because 'id' is missing or blank."))
    }

    /// Suppressed records are withdrawn from discovery.
    fn record_is_deleted(&self, record: &JsonRecord) -> bool {
        record
            .value
            .get("gbl_suppressed_b")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn optional_fields(
        &self,
        _source: &SourceContext,
        record: &JsonRecord,
    ) -> Result<Extraction, ExtractError> {
        let source_record_id = self.source_record_id(record)?;

        let mut publishers: Vec<Publisher> = record
            .str_list("dct_publisher_sm")
            .into_iter()
            .map(Publisher::named)
            .collect();
        publishers.extend(record.str_field("schema_provider_s").map(Publisher::named));

        Ok(Extraction::Fields(OptionalFields {
            alternate_titles: non_empty(
                record
                    .str_list("dct_alternative_sm")
                    .into_iter()
                    .map(|title| AlternateTitle::new(title, None))
                    .collect(),
            ),
            content_type: Some(vec!["Geospatial data".to_string()]),
            contributors: non_empty(
                record
                    .str_list("dct_creator_sm")
                    .into_iter()
                    .map(|creator| Contributor::new(creator, Some("Creator")))
                    .collect(),
            ),
            dates: non_empty(Self::dates(record)?),
            format: record.str_field("dct_format_s").map(str::to_string),
            identifiers: non_empty(
                record
                    .str_list("dct_identifier_sm")
                    .into_iter()
                    .map(|identifier| Identifier::new(identifier, None))
                    .collect(),
            ),
            languages: non_empty(record.str_list("dct_language_sm")),
            links: non_empty(Self::links(record, &source_record_id)),
            locations: non_empty(Self::locations(record)),
            notes: non_empty(
                record
                    .str_list("gbl_displayNote_sm")
                    .into_iter()
                    .map(|note| Note {
                        value: Some(vec![note]),
                        kind: Some("Display note".to_string()),
                    })
                    .collect(),
            ),
            publishers: non_empty(publishers),
            rights: non_empty(Self::rights(record)),
            subjects: non_empty(Self::subjects(record)),
            summary: non_empty(record.str_list("dct_description_sm")),
            ..OptionalFields::default()
        }))
    }
}
