//! Tests for fallback citation synthesis.

use timdex_model::{Contributor, Date, OptionalFields, Publisher};
use timdex_transform::synthesize_citation;

fn author(name: &str, kind: &str) -> Contributor {
    Contributor::new(name, Some(kind))
}

#[test]
fn creators_and_publication_date() {
    let fields = OptionalFields {
        contributors: Some(vec![author("Smith, J.", "author")]),
        dates: Some(vec![Date::new("2022", Some("Publication date"))]),
        ..OptionalFields::default()
    };
    insta::assert_snapshot!(
        synthesize_citation("T", "https://x/1", &fields),
        @"Smith, J. (2022): T. https://x/1"
    );
}

#[test]
fn creators_only_strips_trailing_period() {
    let fields = OptionalFields {
        contributors: Some(vec![
            author("Smith, J.", "Author"),
            author("Doe, A.", "CREATOR"),
            author("Editor, E.", "editor"),
        ]),
        ..OptionalFields::default()
    };
    insta::assert_snapshot!(
        synthesize_citation("T", "https://x/1", &fields),
        @"Smith, J., Doe, A. T. https://x/1"
    );
}

#[test]
fn publication_date_only() {
    let fields = OptionalFields {
        dates: Some(vec![
            Date::new("1999", Some("Issued")),
            Date {
                kind: Some("Publication date".to_string()),
                ..Date::default()
            },
            Date::new("2001", Some("Publication date")),
        ]),
        ..OptionalFields::default()
    };
    insta::assert_snapshot!(
        synthesize_citation("T", "https://x/1", &fields),
        @"T. 2001. https://x/1"
    );
}

#[test]
fn title_only() {
    assert_eq!(
        synthesize_citation("T", "https://x/1", &OptionalFields::default()),
        "T. https://x/1"
    );
}

#[test]
fn publisher_and_content_types_are_appended() {
    let fields = OptionalFields {
        publishers: Some(vec![
            Publisher {
                name: Some("MIT Press".to_string()),
                location: Some("Cambridge, MA".to_string()),
                date: None,
            },
            Publisher::named("Ignored Press"),
        ]),
        content_type: Some(vec!["Dataset".to_string(), "Map".to_string()]),
        ..OptionalFields::default()
    };
    insta::assert_snapshot!(
        synthesize_citation("T", "https://x/1", &fields),
        @"T. Cambridge, MA : MIT Press. Dataset, Map. https://x/1"
    );
}

#[test]
fn contributor_without_kind_is_not_a_creator() {
    let fields = OptionalFields {
        contributors: Some(vec![Contributor::new("Anonymous", None)]),
        ..OptionalFields::default()
    };
    assert_eq!(
        synthesize_citation("T", "https://x/1", &fields),
        "T. https://x/1"
    );
}
