//! Fallback citation synthesis.

use timdex_model::OptionalFields;

const PUBLICATION_DATE: &str = "Publication date";

/// Build a citation string from the fields gathered for one record.
///
/// Used when the source format has no native citation. The result is
/// deterministic for a given set of fields.
pub fn synthesize_citation(title: &str, source_link: &str, fields: &OptionalFields) -> String {
    let creators = fields
        .contributors
        .iter()
        .flatten()
        .filter(|contributor| {
            contributor.kind.as_deref().is_some_and(|kind| {
                kind.eq_ignore_ascii_case("author") || kind.eq_ignore_ascii_case("creator")
            })
        })
        .map(|contributor| contributor.value.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let publication_date = fields
        .dates
        .iter()
        .flatten()
        .filter(|date| date.kind.as_deref() == Some(PUBLICATION_DATE))
        .find_map(|date| date.value.as_deref());

    let mut citation = match (creators.is_empty(), publication_date) {
        (false, Some(date)) => format!("{creators} ({date}): {title}."),
        (false, None) => format!("{}. {title}.", creators.trim_end_matches('.')),
        (true, Some(date)) => format!("{title}. {date}."),
        (true, None) => format!("{title}."),
    };

    if let Some(publisher) = fields.publishers.iter().flatten().next() {
        if let Some(location) = &publisher.location {
            citation.push_str(&format!(" {location} :"));
        }
        if let Some(name) = &publisher.name {
            citation.push_str(&format!(" {name}."));
        }
    }

    if let Some(content_types) = fields.content_type.as_ref().filter(|types| !types.is_empty()) {
        citation.push_str(&format!(" {}.", content_types.join(", ")));
    }

    citation.push(' ');
    citation.push_str(source_link);
    citation
}
