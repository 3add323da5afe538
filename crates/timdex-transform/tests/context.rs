//! Tests for run context derivation.

use std::path::Path;

use chrono::{NaiveDate, TimeZone, Utc};

use timdex_transform::context::parse_source_file_name;
use timdex_transform::{ConfigError, RunContext, RunType};

#[test]
fn values_are_read_from_file_name() {
    let context = RunContext::builder()
        .source_file("/data/libguides-2024-03-01-daily-extracted-records-to-index.xml")
        .run_id("abc")
        .test_environment(false)
        .build()
        .unwrap();
    assert_eq!(context.source, "libguides");
    assert_eq!(context.run_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(context.run_type, RunType::Daily);
    assert_eq!(context.run_id, "abc");
    assert_eq!(
        context.run_timestamp,
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn numbered_file_names_are_recognized() {
    let parts = parse_source_file_name(Path::new(
        "gis-mit-2023-11-20-full-extracted-records-to-index_03.jsonl",
    ))
    .unwrap();
    assert_eq!(parts.source, "gis-mit");
    assert_eq!(parts.run_type, RunType::Full);
}

#[test]
fn explicit_values_override_file_name() {
    let timestamp = Utc.with_ymd_and_hms(2024, 3, 2, 12, 30, 0).unwrap();
    let context = RunContext::builder()
        .source_file("libguides-2024-03-01-daily-extracted-records-to-index.xml")
        .source("researchdatabases")
        .run_type(RunType::Full)
        .run_timestamp(timestamp)
        .build()
        .unwrap();
    assert_eq!(context.source, "researchdatabases");
    assert_eq!(context.run_type, RunType::Full);
    assert_eq!(context.run_timestamp, timestamp);
}

#[test]
fn run_id_is_minted_when_absent() {
    let first = RunContext::builder()
        .source_file("libguides-2024-03-01-daily-extracted-records-to-index.xml")
        .build()
        .unwrap();
    let second = RunContext::builder()
        .source_file("libguides-2024-03-01-daily-extracted-records-to-index.xml")
        .build()
        .unwrap();
    assert_eq!(first.run_id.len(), 36);
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn unconventional_name_is_rejected() {
    let err = RunContext::builder()
        .source_file("records.xml")
        .test_environment(false)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnrecognizedFileName { .. }));
}

#[test]
fn unconventional_name_in_test_environment_uses_placeholder() {
    let context = RunContext::builder()
        .source_file("records.xml")
        .test_environment(true)
        .run_id("run-1")
        .build()
        .unwrap();
    assert_eq!(context.source, "placeholder");
}

#[test]
fn unconventional_name_is_accepted_with_overrides() {
    let context = RunContext::builder()
        .source_file("records.xml")
        .source("whoas")
        .run_date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        .run_type(RunType::Incremental)
        .build()
        .unwrap();
    assert_eq!(context.source, "whoas");
    assert_eq!(context.run_type.as_str(), "incremental");
}

#[test]
fn missing_source_file_outside_test_environment_is_a_config_error() {
    let err = RunContext::builder()
        .test_environment(false)
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "'source_file' parameter is required outside of test environments"
    );
}

#[test]
fn test_environment_uses_placeholder_run_data() {
    let context = RunContext::builder()
        .test_environment(true)
        .run_id("run-1")
        .build()
        .unwrap();
    assert_eq!(context.source, "placeholder");
    assert_eq!(context.run_date_string(), "2000-01-01");
    assert_eq!(context.run_type, RunType::Daily);
}

#[test]
fn run_type_parses_case_insensitively() {
    assert_eq!("FULL".parse::<RunType>().unwrap(), RunType::Full);
    assert!(matches!(
        "weekly".parse::<RunType>(),
        Err(ConfigError::InvalidRunType { .. })
    ));
}

#[test]
fn provenance_uses_run_values() {
    let context = RunContext::builder()
        .source_file("aspace-2024-03-01-full-extracted-records-to-index.xml")
        .run_id("run-9")
        .build()
        .unwrap();
    let provenance = context.provenance(7);
    assert_eq!(provenance.source, "aspace");
    assert_eq!(provenance.run_date, "2024-03-01");
    assert_eq!(provenance.run_id, "run-9");
    assert_eq!(provenance.run_record_offset, 7);
}
