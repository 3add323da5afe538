//! Tests for the XML and JSON Lines record readers.

use std::io::{Cursor, Write};

use timdex_ingest::{IngestError, JsonRecords, SourceRecord, XmlRecords};

const OAI_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <ListRecords>
    <record>
      <header>
        <identifier>oai:libguides.com:guides/175846</identifier>
      </header>
      <metadata>
        <oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/" xmlns:dc="http://purl.org/dc/elements/1.1/">
          <dc:title>Materials &amp; Methods</dc:title>
          <dc:creator>Smith, J.</dc:creator>
          <dc:creator><![CDATA[Doe, A.]]></dc:creator>
        </oai_dc:dc>
      </metadata>
    </record>
    <record>
      <header status="deleted">
        <identifier>oai:libguides.com:guides/175847</identifier>
      </header>
    </record>
  </ListRecords>
</OAI-PMH>
"#;

#[test]
fn xml_reader_streams_each_record() {
    let records: Vec<_> = XmlRecords::from_reader(Cursor::new(OAI_RESPONSE))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 2);

    let first = &records[0].element;
    assert_eq!(first.name, "record");
    assert_eq!(
        first.find("header").and_then(|h| h.child("identifier")).map(|i| i.text()),
        Some("oai:libguides.com:guides/175846")
    );
    assert_eq!(first.find_all_text("dc:title"), vec!["Materials & Methods"]);
    assert_eq!(first.find_all_text("creator"), vec!["Smith, J.", "Doe, A."]);

    let second = &records[1].element;
    assert_eq!(
        second.find("header").and_then(|h| h.attribute("status")),
        Some("deleted")
    );
}

#[test]
fn xml_reader_keeps_raw_record_bytes() {
    let record = XmlRecords::from_reader(Cursor::new(OAI_RESPONSE))
        .next()
        .unwrap()
        .unwrap();
    let raw = String::from_utf8(record.raw_bytes().to_vec()).unwrap();
    assert!(raw.starts_with("<record>"));
    assert!(raw.ends_with("</record>"));
    assert!(raw.contains("guides/175846"));
    assert!(!raw.contains("guides/175847"));
}

#[test]
fn xml_reader_honours_custom_record_tag() {
    let xml = "<collection><item><title>A</title></item><item/></collection>";
    let records: Vec<_> = XmlRecords::from_reader(Cursor::new(xml))
        .with_record_tag("item")
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].element.find_all_text("title"), vec!["A"]);
    assert!(records[1].element.children.is_empty());
}

#[test]
fn malformed_record_is_reported_and_reading_resumes() {
    let xml = "<ListRecords>\
        <record><header><identifier>oai:x:1</identifier></header></record>\
        <record><header><identifier>oai:x:2</identifier></heder><metadata/></record>\
        <record><header><identifier>oai:x:3</identifier></header></record>\
        </ListRecords>";
    let results: Vec<_> = XmlRecords::from_reader(Cursor::new(xml)).collect();
    assert_eq!(results.len(), 3);

    let ids: Vec<_> = results
        .iter()
        .filter_map(|result| result.as_ref().ok())
        .map(|record| record.element.find_all_text("identifier"))
        .collect();
    assert_eq!(ids, vec![vec!["oai:x:1"], vec!["oai:x:3"]]);

    let error = results[1].as_ref().unwrap_err();
    assert!(error.is_recoverable());
    assert!(error.to_string().contains("expected </header>, found </heder>"));
    let raw = String::from_utf8(error.record_bytes().unwrap().to_vec()).unwrap();
    assert!(raw.starts_with("<record>"));
    assert!(raw.contains("oai:x:2"));
    assert!(raw.ends_with("</record>"));
}

#[test]
fn mismatched_close_of_the_record_itself_ends_that_record() {
    let xml = "<root><record><title>x</record><record><title>y</title></record></root>";
    let mut records = XmlRecords::from_reader(Cursor::new(xml));
    assert!(matches!(
        records.next(),
        Some(Err(IngestError::MalformedRecord { .. }))
    ));
    let next = records.next().unwrap().unwrap();
    assert_eq!(next.element.find_all_text("title"), vec!["y"]);
    assert!(records.next().is_none());
}

#[test]
fn truncated_document_yields_one_error_then_ends() {
    let xml = "<root><record><title>x</title><record><title>y";
    let mut records = XmlRecords::from_reader(Cursor::new(xml));
    let error = records.next().unwrap().unwrap_err();
    assert!(matches!(error, IngestError::Xml { .. }));
    assert!(!error.is_recoverable());
    assert!(records.next().is_none());
}

#[test]
fn json_reader_skips_blank_lines() {
    let input = "{\"id\": \"a\"}\n\n{\"id\": \"b\", \"tags\": [\"x\", 1, \"y\"]}\n";
    let records: Vec<_> = JsonRecords::from_reader(Cursor::new(input))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].str_field("id"), Some("a"));
    assert_eq!(records[0].raw_bytes(), b"{\"id\": \"a\"}");
    assert_eq!(records[1].str_list("tags"), vec!["x", "y"]);
    assert!(records[1].str_field("missing").is_none());
}

#[test]
fn json_reader_rejects_non_object_lines_and_continues() {
    let input = "{\"id\": \"a\"}\n[1, 2]\n{\"id\": \"c\"}\n";
    let mut records = JsonRecords::from_reader(Cursor::new(input));
    assert!(records.next().unwrap().is_ok());
    let error = records.next().unwrap().unwrap_err();
    assert!(matches!(error, IngestError::NotAnObject { line: 2, .. }));
    assert_eq!(error.record_bytes(), Some(&b"[1, 2]"[..]));
    assert_eq!(records.next().unwrap().unwrap().str_field("id"), Some("c"));
    assert!(records.next().is_none());
}

#[test]
fn json_reader_reports_parse_errors_with_line() {
    let input = "{\"id\": \"a\"}\n{not json}\n";
    let mut records = JsonRecords::from_reader(Cursor::new(input));
    records.next();
    assert!(matches!(
        records.next(),
        Some(Err(IngestError::Json { line: 2, .. }))
    ));
}

#[test]
fn open_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{{\"url\": \"https://libraries.mit.edu/\"}}").unwrap();
    let records: Vec<_> = JsonRecords::open(file.path())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn open_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.xml");
    assert!(matches!(
        XmlRecords::open(&missing),
        Err(IngestError::Open { .. })
    ));
}
