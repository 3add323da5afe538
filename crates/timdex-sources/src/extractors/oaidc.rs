use std::collections::BTreeSet;

use timdex_ingest::{XmlElement, XmlRecord};
use timdex_model::{Contributor, Date, Identifier, OptionalFields, Publisher, Subject};
use timdex_transform::dates::validate_date;
use timdex_transform::{ExtractError, Extraction, Extractor, SourceContext};

use super::non_empty;

const NO_CONTENT_TYPE: &str = "no content type in source record";

/// Simple Dublin Core records wrapped in an OAI-PMH `<record>` envelope.
///
/// With a non-empty set of invalid content types, records whose `dc:type`
/// values are all in the set are rejected.
#[derive(Debug, Clone, Default)]
pub struct OaiDc {
    invalid_content_types: BTreeSet<String>,
}

impl OaiDc {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_invalid_content_types<I, S>(mut self, content_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.invalid_content_types = content_types
            .into_iter()
            .map(|content_type| content_type.as_ref().to_lowercase())
            .collect();
        self
    }

    fn header(record: &XmlRecord) -> Option<&XmlElement> {
        record.element.child("header")
    }

    /// Text of every non-blank `name` element under `<metadata>`.
    pub(crate) fn dc_values(record: &XmlRecord, name: &str) -> Vec<String> {
        record
            .element
            .child("metadata")
            .map(|metadata| metadata.find_all_text(name))
            .unwrap_or_default()
    }

    fn header_identifier(record: &XmlRecord) -> Option<&str> {
        Self::header(record)
            .and_then(|header| header.child("identifier"))
            .and_then(XmlElement::text_value)
    }

    fn is_rejected(&self, content_types: &[String]) -> bool {
        !self.invalid_content_types.is_empty()
            && content_types
                .iter()
                .all(|content_type| self.invalid_content_types.contains(&content_type.to_lowercase()))
    }
}

impl Extractor for OaiDc {
    type Record = XmlRecord;

    fn main_titles(&self, record: &XmlRecord) -> Vec<String> {
        Self::dc_values(record, "dc:title")
    }

    /// Last `:`-separated segment of the header identifier, e.g. `123` for
    /// `oai:example.org:123`.
    fn source_record_id(&self, record: &XmlRecord) -> Result<String, ExtractError> {
        Self::header_identifier(record)
            .and_then(|identifier| identifier.rsplit(':').next())
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ExtractError::skip(
                    "Record skipped because 'source_record_id' could not be derived. \
                     The 'identifier' was either missing from the header element or blank.",
                )
            })
    }

    fn record_is_deleted(&self, record: &XmlRecord) -> bool {
        Self::header(record)
            .and_then(|header| header.attribute("status"))
            .is_some_and(|status| status == "deleted")
    }

    fn optional_fields(
        &self,
        source: &SourceContext,
        record: &XmlRecord,
    ) -> Result<Extraction, ExtractError> {
        let source_record_id = self.source_record_id(record)?;

        let content_type = if self.invalid_content_types.is_empty() {
            vec![source.code.clone()]
        } else {
            let types = Self::dc_values(record, "dc:type");
            let checked = if types.is_empty() {
                vec![NO_CONTENT_TYPE.to_string()]
            } else {
                types.clone()
            };
            if self.is_rejected(&checked) {
                return Ok(Extraction::ContentTypeRejected {
                    content_types: checked,
                });
            }
            types
        };

        let dates = Self::dc_values(record, "dc:date")
            .into_iter()
            .filter(|date| validate_date(date, &source_record_id))
            .map(|date| Date::new(date, Some("Unknown")))
            .collect();

        let subjects = Self::dc_values(record, "dc:subject");
        let subjects = non_empty(subjects)
            .map(|values| vec![Subject::new(values, Some("Subject scheme not provided"))]);

        Ok(Extraction::Fields(OptionalFields {
            content_type: non_empty(content_type),
            contributors: non_empty(
                Self::dc_values(record, "dc:creator")
                    .into_iter()
                    .map(|creator| Contributor::new(creator, Some("Creator")))
                    .collect(),
            ),
            dates: non_empty(dates),
            format: Some("electronic resource".to_string()),
            identifiers: Self::header_identifier(record)
                .map(|identifier| vec![Identifier::new(identifier, Some("OAI-PMH"))]),
            publishers: non_empty(
                Self::dc_values(record, "dc:publisher")
                    .into_iter()
                    .map(Publisher::named)
                    .collect(),
            ),
            subjects,
            summary: non_empty(Self::dc_values(record, "dc:description")),
            ..OptionalFields::default()
        }))
    }
}
