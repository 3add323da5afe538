//! Tests for the transformer state machine using a spy extractor.

use std::cell::RefCell;
use std::io;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use proptest::prelude::*;
use serde_json::Value;

use timdex_ingest::{IngestError, SourceRecord};
use timdex_model::{Contributor, OptionalFields, TITLE_NOT_PROVIDED};
use timdex_transform::{
    Action, ExclusionList, ExtractError, Extraction, Extractor, RunContext, RunType, SkipReason,
    SourceContext, TransformError, Transformer,
};

#[derive(Debug, Clone)]
enum Behavior {
    Fields,
    Reject,
    Skip(&'static str),
    Fail(&'static str),
    EmptyList,
}

#[derive(Debug, Clone)]
struct TestRecord {
    id: &'static str,
    titles: Vec<&'static str>,
    deleted: bool,
    behavior: Behavior,
    raw: Vec<u8>,
}

impl TestRecord {
    fn new(id: &'static str, behavior: Behavior) -> Self {
        Self {
            id,
            titles: vec!["A Title"],
            deleted: false,
            behavior,
            raw: format!("<record>{id}</record>").into_bytes(),
        }
    }

    fn titled(mut self, titles: Vec<&'static str>) -> Self {
        self.titles = titles;
        self
    }

    fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }
}

impl SourceRecord for TestRecord {
    fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Records every optional-field extraction it performs.
#[derive(Default)]
struct SpyExtractor {
    extracted: RefCell<Vec<String>>,
}

impl Extractor for SpyExtractor {
    type Record = TestRecord;

    fn main_titles(&self, record: &TestRecord) -> Vec<String> {
        record.titles.iter().map(ToString::to_string).collect()
    }

    fn source_record_id(&self, record: &TestRecord) -> Result<String, ExtractError> {
        Ok(record.id.to_string())
    }

    fn record_is_deleted(&self, record: &TestRecord) -> bool {
        record.deleted
    }

    fn optional_fields(
        &self,
        _source: &SourceContext,
        record: &TestRecord,
    ) -> Result<Extraction, ExtractError> {
        self.extracted.borrow_mut().push(record.id.to_string());
        match &record.behavior {
            Behavior::Fields => Ok(Extraction::Fields(OptionalFields {
                contributors: Some(vec![Contributor::new("Smith, J.", Some("author"))]),
                ..OptionalFields::default()
            })),
            Behavior::Reject => Ok(Extraction::ContentTypeRejected {
                content_types: vec!["thesis".to_string()],
            }),
            Behavior::Skip(reason) => Err(ExtractError::skip_record(record.id, *reason)),
            Behavior::Fail(message) => Err(anyhow::anyhow!(*message).into()),
            Behavior::EmptyList => Ok(Extraction::Fields(OptionalFields {
                summary: Some(vec![]),
                ..OptionalFields::default()
            })),
        }
    }
}

fn run_context() -> RunContext {
    RunContext::builder()
        .source("test")
        .run_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        .run_type(RunType::Daily)
        .run_id("run-1")
        .build()
        .unwrap()
}

fn source_context() -> SourceContext {
    SourceContext::new("test", "Test Source", "https://example.org/", run_context())
}

fn transformer(
    records: Vec<TestRecord>,
) -> Transformer<SpyExtractor, impl Iterator<Item = Result<TestRecord, IngestError>>> {
    Transformer::new(
        SpyExtractor::default(),
        source_context(),
        records.into_iter().map(Ok),
    )
}

fn transformed_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}

#[test]
fn indexed_record_carries_payload_and_provenance() {
    let mut pipeline = transformer(vec![TestRecord::new("1", Behavior::Fields)]);
    let row = pipeline.next().unwrap().unwrap();

    assert_eq!(row.action, Action::Index);
    assert_eq!(row.timdex_record_id.as_deref(), Some("test:1"));
    assert_eq!(row.run_record_offset, Some(0));
    assert_eq!(row.source_record, b"<record>1</record>");
    assert_eq!(row.run_id, "run-1");

    let json = transformed_json(row.transformed_record.as_deref().unwrap());
    assert_eq!(json["source"], "Test Source");
    assert_eq!(json["source_link"], "https://example.org/1");
    assert_eq!(json["title"], "A Title");
    assert_eq!(json["citation"], "Smith, J. A Title. https://example.org/1");
    assert_eq!(json["content_type"], serde_json::json!(["Not specified"]));
    insta::assert_json_snapshot!(json["timdex_provenance"], @r#"
    {
      "run_date": "2024-03-01",
      "run_id": "run-1",
      "run_record_offset": 0,
      "source": "test"
    }
    "#);
    assert!(pipeline.next().is_none());
}

#[test]
fn missing_title_uses_sentinel_and_warns() {
    let record = TestRecord::new("no-title", Behavior::Fields).titled(vec![]);
    let (row, logs) = with_captured_logs(|| transformer(vec![record]).next().unwrap().unwrap());

    assert_eq!(row.action, Action::Index);
    let json = transformed_json(row.transformed_record.as_deref().unwrap());
    assert_eq!(json["title"], TITLE_NOT_PROVIDED);
    assert!(logs.contains("WARN"));
    assert!(logs.contains(
        "Record no-title was missing a title, source record should be investigated."
    ));
}

#[test]
fn blank_titles_count_as_missing() {
    let record = TestRecord::new("blank", Behavior::Fields).titled(vec!["  ", ""]);
    let row = transformer(vec![record]).next().unwrap().unwrap();
    let json = transformed_json(row.transformed_record.as_deref().unwrap());
    assert_eq!(json["title"], TITLE_NOT_PROVIDED);
}

#[test]
fn multiple_titles_use_first_and_warn() {
    let record = TestRecord::new("two", Behavior::Fields).titled(vec!["First", "Second"]);
    let (row, logs) = with_captured_logs(|| transformer(vec![record]).next().unwrap().unwrap());

    let json = transformed_json(row.transformed_record.as_deref().unwrap());
    assert_eq!(json["title"], "First");
    assert!(logs.contains("Record two has multiple titles"));
    assert!(logs.contains("\"First\""));
    assert!(logs.contains("\"Second\""));
}

#[test]
fn skip_signal_is_recovered_and_iteration_continues() {
    let mut pipeline = transformer(vec![
        TestRecord::new("1", Behavior::Skip("excluded: not in scope")),
        TestRecord::new("2", Behavior::Fields),
    ]);

    let first = pipeline.next().unwrap().unwrap();
    assert_eq!(first.action, Action::Skip);
    assert_eq!(
        first.skip_reason,
        Some(SkipReason::Signal("excluded: not in scope".to_string()))
    );
    assert!(first.transformed_record.is_none());
    assert!(first.run_record_offset.is_none());
    assert_eq!(first.source_record, b"<record>1</record>");
    assert_eq!(pipeline.stats().skipped, 1);
    assert_eq!(pipeline.stats().processed, 1);

    let second = pipeline.next().unwrap().unwrap();
    assert_eq!(second.action, Action::Index);
    assert_eq!(second.run_record_offset, Some(0));
    assert_eq!(pipeline.stats().processed, 2);
}

#[test]
fn deleted_record_skips_field_extraction() {
    let mut pipeline = transformer(vec![TestRecord::new("gone", Behavior::Fields).deleted()]);
    let row = pipeline.next().unwrap().unwrap();

    assert_eq!(row.action, Action::Delete);
    assert_eq!(row.timdex_record_id.as_deref(), Some("test:gone"));
    assert!(row.transformed_record.is_none());
    assert!(row.run_record_offset.is_none());
    assert_eq!(pipeline.stats().deleted, 1);
    assert!(pipeline.next().is_none());
}

#[test]
fn deleted_record_never_calls_optional_fields() {
    let extractor = SpyExtractor::default();
    let records = vec![
        TestRecord::new("gone", Behavior::Fields).deleted(),
        TestRecord::new("kept", Behavior::Fields),
    ];
    let mut pipeline = Transformer::new(extractor, source_context(), records.into_iter().map(Ok));
    let actions: Vec<Action> = pipeline.by_ref().map(|row| row.unwrap().action).collect();
    assert_eq!(actions, vec![Action::Delete, Action::Index]);

    let (extractor, _) = pipeline.into_parts();
    assert_eq!(*extractor.extracted.borrow(), vec!["kept".to_string()]);
}

#[test]
fn excluded_source_link_is_skipped() {
    let exclusions = ExclusionList::from_iter(["https://example.org/1"]);
    let mut pipeline =
        transformer(vec![TestRecord::new("1", Behavior::Fields)]).with_exclusions(exclusions);
    let row = pipeline.next().unwrap().unwrap();

    assert_eq!(row.action, Action::Skip);
    assert_eq!(row.skip_reason, Some(SkipReason::Excluded));
    assert_eq!(row.source_record, b"<record>1</record>");
    assert!(row.transformed_record.is_none());
}

#[test]
fn rejected_content_type_is_skipped() {
    let row = transformer(vec![TestRecord::new("1", Behavior::Reject)])
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(row.action, Action::Skip);
    assert_eq!(row.skip_reason, Some(SkipReason::ContentTypeRejected));
    assert_eq!(
        row.skip_reason.map(|reason| reason.to_string()).as_deref(),
        Some("content type rejected")
    );
}

#[test]
fn extraction_failure_becomes_error_row() {
    let (rows, logs) = with_captured_logs(|| {
        transformer(vec![
            TestRecord::new("1", Behavior::Fail("boom")),
            TestRecord::new("2", Behavior::Fields),
        ])
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
    });

    assert_eq!(rows[0].action, Action::Error);
    assert_eq!(rows[0].error_message.as_deref(), Some("boom"));
    assert_eq!(rows[0].timdex_record_id.as_deref(), Some("test:1"));
    assert!(rows[0].transformed_record.is_none());
    assert_eq!(rows[1].action, Action::Index);
    assert!(logs.contains("Unhandled exception during record transformation: boom"));
}

#[test]
fn validation_failure_becomes_error_row() {
    let row = transformer(vec![TestRecord::new("1", Behavior::EmptyList)])
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(row.action, Action::Error);
    assert_eq!(
        row.error_message.as_deref(),
        Some("'summary' cannot be an empty list, received: '[]'.")
    );
}

#[test]
fn unparseable_record_becomes_error_row_and_run_continues() {
    let records: Vec<Result<TestRecord, IngestError>> = vec![
        Ok(TestRecord::new("1", Behavior::Fields)),
        Err(IngestError::MalformedRecord {
            position: 120,
            message: "expected </header>, found </heder>".to_string(),
            raw: b"<record><header></heder></record>".to_vec(),
        }),
        Ok(TestRecord::new("3", Behavior::Fields)),
    ];
    let mut pipeline =
        Transformer::new(SpyExtractor::default(), source_context(), records.into_iter());
    let rows: Vec<_> = pipeline.by_ref().collect::<Result<_, _>>().unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].action, Action::Error);
    assert_eq!(rows[1].source_record, b"<record><header></heder></record>");
    assert!(rows[1].timdex_record_id.is_none());
    assert!(rows[1].transformed_record.is_none());
    assert!(
        rows[1]
            .error_message
            .as_deref()
            .unwrap()
            .contains("found </heder>")
    );
    assert_eq!(rows[2].action, Action::Index);
    assert_eq!(rows[2].run_record_offset, Some(1));

    let stats = pipeline.stats();
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.errored, 1);
    assert_eq!(stats.indexed, 2);
}

#[test]
fn stream_failure_ends_the_run() {
    let records: Vec<Result<TestRecord, IngestError>> = vec![
        Ok(TestRecord::new("1", Behavior::Fields)),
        Err(IngestError::Io(std::io::Error::other("disk gone"))),
        Ok(TestRecord::new("3", Behavior::Fields)),
    ];
    let mut pipeline =
        Transformer::new(SpyExtractor::default(), source_context(), records.into_iter());

    assert!(pipeline.next().unwrap().is_ok());
    assert!(matches!(
        pipeline.next(),
        Some(Err(TransformError::Source { processed: 1, .. }))
    ));
    assert!(pipeline.next().is_none());
}

fn behavior_strategy() -> impl Strategy<Value = (Behavior, bool)> {
    prop_oneof![
        Just((Behavior::Fields, false)),
        Just((Behavior::Fields, true)),
        Just((Behavior::Reject, false)),
        Just((Behavior::Skip("skip"), false)),
        Just((Behavior::Fail("fail"), false)),
        Just((Behavior::EmptyList, false)),
    ]
}

proptest! {
    #[test]
    fn offsets_are_contiguous_and_counters_balance(
        behaviors in prop::collection::vec(behavior_strategy(), 0..40)
    ) {
        const IDS: [&str; 40] = [
            "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
            "10", "11", "12", "13", "14", "15", "16", "17", "18", "19",
            "20", "21", "22", "23", "24", "25", "26", "27", "28", "29",
            "30", "31", "32", "33", "34", "35", "36", "37", "38", "39",
        ];
        let records: Vec<TestRecord> = behaviors
            .iter()
            .enumerate()
            .map(|(index, (behavior, deleted))| {
                let record = TestRecord::new(IDS[index], behavior.clone());
                if *deleted { record.deleted() } else { record }
            })
            .collect();
        let total = records.len() as u64;
        let mut pipeline = transformer(records);
        let rows: Vec<_> = pipeline.by_ref().map(Result::unwrap).collect();

        let offsets: Vec<u64> = rows
            .iter()
            .filter(|row| row.action == Action::Index)
            .map(|row| row.run_record_offset.unwrap())
            .collect();
        let expected: Vec<u64> = (0..offsets.len() as u64).collect();
        prop_assert_eq!(offsets, expected);
        prop_assert!(rows
            .iter()
            .filter(|row| row.action != Action::Index)
            .all(|row| row.run_record_offset.is_none()));

        let stats = *pipeline.stats();
        prop_assert_eq!(stats.processed, total);
        prop_assert_eq!(stats.classified(), stats.processed);
        prop_assert_eq!(rows.len() as u64, total);
    }
}
