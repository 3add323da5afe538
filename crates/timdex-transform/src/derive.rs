//! Fields derived from values already extracted for a record.

use timdex_model::{Date, Location, OptionalFields, extend_field};

use crate::citation::synthesize_citation;
use crate::dates::validate_date;

const SPATIAL_SUBJECT_KIND: &str = "Dublin Core; Spatial";
const CONTENT_TYPE_NOT_SPECIFIED: &str = "Not specified";

/// Extend `fields` with derived dates and locations, fill in a citation
/// when none was extracted, then default the content type.
///
/// The citation is synthesized before the content type default is
/// applied, so "Not specified" never appears in a citation.
pub fn generate_derived_fields(
    title: &str,
    source_link: &str,
    timdex_record_id: &str,
    fields: &mut OptionalFields,
) {
    let publication_dates: Vec<Date> = fields
        .publishers
        .iter()
        .flatten()
        .filter_map(|publisher| publisher.date.as_deref())
        .filter(|date| validate_date(date, timdex_record_id))
        .map(|date| Date::new(date, Some("Publication date")))
        .collect();
    extend_field(&mut fields.dates, publication_dates);

    let publication_places: Vec<Location> = fields
        .publishers
        .iter()
        .flatten()
        .filter_map(|publisher| publisher.location.clone())
        .map(|place| Location {
            value: Some(place),
            kind: Some("Place of Publication".to_string()),
            geoshape: None,
        })
        .collect();
    extend_field(&mut fields.locations, publication_places);

    let place_names: Vec<Location> = fields
        .subjects
        .iter()
        .flatten()
        .filter(|subject| subject.kind.as_deref() == Some(SPATIAL_SUBJECT_KIND))
        .flat_map(|subject| subject.value.iter().flatten())
        .map(|place| Location {
            value: Some(place.clone()),
            kind: Some("Place Name".to_string()),
            geoshape: None,
        })
        .collect();
    extend_field(&mut fields.locations, place_names);

    if fields.citation.is_none() {
        fields.citation = Some(synthesize_citation(title, source_link, fields));
    }

    if fields.content_type.as_ref().is_none_or(Vec::is_empty) {
        fields.content_type = Some(vec![CONTENT_TYPE_NOT_SPECIFIED.to_string()]);
    }
}
