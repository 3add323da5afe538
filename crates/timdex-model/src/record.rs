//! The normalized record and its field accumulator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dedupe::dedupe_slot;
use crate::error::{Result, ValidationError};
use crate::fields::{
    AlternateTitle, Contributor, Date, Funder, Holding, Identifier, Link, Location, Note,
    Publisher, RelatedItem, Rights, Subject, Validate,
};
use crate::provenance::TimdexProvenance;

/// Title used when a source record has no usable title.
pub const TITLE_NOT_PROVIDED: &str = "Title not provided";

const REQUIRED_FIELDS: [&str; 4] = ["source", "source_link", "timdex_record_id", "title"];

/// Fields every record must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields {
    /// Human-readable name of the origin.
    pub source: String,
    pub source_link: String,
    /// `{source-code}:{sanitized source record id}`.
    pub timdex_record_id: String,
    pub title: String,
}

/// Accumulator for optional fields.
///
/// Extractors fill this in freely; it is validated and deduplicated only
/// when merged into a [`NormalizedRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionalFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_titles: Option<Vec<AlternateTitle>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_numbers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<Vec<Contributor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<Date>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_formats: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_information: Option<Vec<Funder>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holdings: Option<Vec<Holding>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<Vec<Identifier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literary_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_frequency: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishers: Option<Vec<Publisher>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_items: Option<Vec<RelatedItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rights: Option<Vec<Rights>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<Subject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Vec<String>>,
}

/// Append items to a list field, leaving it absent when nothing is added.
pub fn extend_field<T>(slot: &mut Option<Vec<T>>, items: impl IntoIterator<Item = T>) {
    let mut items = items.into_iter().peekable();
    if items.peek().is_some() {
        slot.get_or_insert_with(Vec::new).extend(items);
    }
}

fn check_list<T: Validate + std::fmt::Debug>(field: &str, slot: Option<&Vec<T>>) -> Result<()> {
    let Some(items) = slot else {
        return Ok(());
    };
    if items.is_empty() {
        return Err(ValidationError::EmptyList {
            field: field.to_string(),
            value: format!("{items:?}"),
        });
    }
    items.iter().try_for_each(|item| item.validate(field))
}

impl OptionalFields {
    fn dedupe(&mut self) {
        dedupe_slot(&mut self.alternate_titles);
        dedupe_slot(&mut self.call_numbers);
        dedupe_slot(&mut self.content_type);
        dedupe_slot(&mut self.contents);
        dedupe_slot(&mut self.contributors);
        dedupe_slot(&mut self.dates);
        dedupe_slot(&mut self.file_formats);
        dedupe_slot(&mut self.funding_information);
        dedupe_slot(&mut self.holdings);
        dedupe_slot(&mut self.identifiers);
        dedupe_slot(&mut self.languages);
        dedupe_slot(&mut self.links);
        dedupe_slot(&mut self.locations);
        dedupe_slot(&mut self.notes);
        dedupe_slot(&mut self.publication_frequency);
        dedupe_slot(&mut self.publishers);
        dedupe_slot(&mut self.related_items);
        dedupe_slot(&mut self.rights);
        dedupe_slot(&mut self.subjects);
        dedupe_slot(&mut self.summary);
    }

    fn validate(&self) -> Result<()> {
        check_list("alternate_titles", self.alternate_titles.as_ref())?;
        check_list("call_numbers", self.call_numbers.as_ref())?;
        check_list("content_type", self.content_type.as_ref())?;
        check_list("contents", self.contents.as_ref())?;
        check_list("contributors", self.contributors.as_ref())?;
        check_list("dates", self.dates.as_ref())?;
        check_list("file_formats", self.file_formats.as_ref())?;
        check_list("funding_information", self.funding_information.as_ref())?;
        check_list("holdings", self.holdings.as_ref())?;
        check_list("identifiers", self.identifiers.as_ref())?;
        check_list("languages", self.languages.as_ref())?;
        check_list("links", self.links.as_ref())?;
        check_list("locations", self.locations.as_ref())?;
        check_list("notes", self.notes.as_ref())?;
        check_list("publication_frequency", self.publication_frequency.as_ref())?;
        check_list("publishers", self.publishers.as_ref())?;
        check_list("related_items", self.related_items.as_ref())?;
        check_list("rights", self.rights.as_ref())?;
        check_list("subjects", self.subjects.as_ref())?;
        check_list("summary", self.summary.as_ref())
    }
}

/// A validated TIMDEX record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    source: String,
    source_link: String,
    timdex_record_id: String,
    title: String,
    #[serde(flatten)]
    fields: OptionalFields,
}

impl NormalizedRecord {
    /// Merge required and optional fields into a record.
    ///
    /// List fields are deduplicated first, then every invariant is checked.
    /// The first violation is returned.
    pub fn new(required: RequiredFields, mut fields: OptionalFields) -> Result<Self> {
        for (field, value) in [
            ("source", &required.source),
            ("source_link", &required.source_link),
            ("timdex_record_id", &required.timdex_record_id),
            ("title", &required.title),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::BlankRequired {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }
        fields.validate()?;
        fields.dedupe();
        Ok(Self {
            source: required.source,
            source_link: required.source_link,
            timdex_record_id: required.timdex_record_id,
            title: required.title,
            fields,
        })
    }

    /// Rebuild a record from its canonical map, checking element types.
    pub fn from_canonical_map(map: &Map<String, Value>) -> Result<Self> {
        let required_value = |field: &str| -> Result<String> {
            match map.get(field) {
                Some(Value::String(value)) => Ok(value.clone()),
                Some(other) => Err(ValidationError::InvalidType {
                    field: field.to_string(),
                    value: other.to_string(),
                    message: "expected a string".to_string(),
                }),
                None => Err(ValidationError::BlankRequired {
                    field: field.to_string(),
                    value: String::new(),
                }),
            }
        };
        let required = RequiredFields {
            source: required_value("source")?,
            source_link: required_value("source_link")?,
            timdex_record_id: required_value("timdex_record_id")?,
            title: required_value("title")?,
        };

        let optional: Map<String, Value> = map
            .iter()
            .filter(|(key, _)| !REQUIRED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        // Check one key at a time so the error names the offending field.
        for (key, value) in &optional {
            let single = Map::from_iter([(key.clone(), value.clone())]);
            if let Err(error) = serde_json::from_value::<OptionalFields>(Value::Object(single)) {
                if error.to_string().starts_with("unknown field") {
                    return Err(ValidationError::UnknownField { field: key.clone() });
                }
                return Err(ValidationError::InvalidType {
                    field: key.clone(),
                    value: value.to_string(),
                    message: error.to_string(),
                });
            }
        }
        let fields = serde_json::from_value::<OptionalFields>(Value::Object(optional)).map_err(
            |error| ValidationError::InvalidType {
                field: "record".to_string(),
                value: String::new(),
                message: error.to_string(),
            },
        )?;
        Self::new(required, fields)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_link(&self) -> &str {
        &self.source_link
    }

    pub fn timdex_record_id(&self) -> &str {
        &self.timdex_record_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &OptionalFields {
        &self.fields
    }

    /// Render the record as a nested map with every null or empty value
    /// pruned. This is the persisted shape.
    pub fn to_canonical_map(&self) -> std::result::Result<Map<String, Value>, serde_json::Error> {
        Ok(match prune(serde_json::to_value(self)?) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        })
    }

    /// Canonical map with a `timdex_provenance` block attached.
    pub fn to_canonical_map_with_provenance(
        &self,
        provenance: &TimdexProvenance,
    ) -> std::result::Result<Map<String, Value>, serde_json::Error> {
        let mut map = self.to_canonical_map()?;
        map.insert(
            "timdex_provenance".to_string(),
            serde_json::to_value(provenance)?,
        );
        Ok(map)
    }
}

fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().filter_map(prune).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, value)| prune(value).map(|value| (key, value)))
                .collect();
            (!map.is_empty()).then_some(Value::Object(map))
        }
        other => Some(other),
    }
}
