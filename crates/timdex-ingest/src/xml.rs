//! Streaming reader for XML harvests.
//!
//! Harvest files wrap many `<record>` elements in an arbitrary envelope
//! (OAI-PMH responses, MARC collections). The reader walks the event stream
//! and materializes one record subtree at a time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::SourceRecord;
use crate::error::{IngestError, Result};

const DEFAULT_RECORD_TAG: &str = "record";

/// An owned XML element subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `dc:title`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// Direct character content, with references resolved.
    pub text: String,
}

impl XmlElement {
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// A qualified name (`dc:title`) matches exactly; a bare name matches
    /// the local part under any prefix.
    pub fn matches(&self, name: &str) -> bool {
        if name.contains(':') {
            self.name == name
        } else {
            self.local_name() == name
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(key, _)| !name.contains(':') && local_part(key) == name)
            })
            .map(|(_, value)| value.as_str())
    }

    /// Direct text, trimmed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Direct text, or `None` when blank.
    pub fn text_value(&self) -> Option<&str> {
        Some(self.text()).filter(|text| !text.is_empty())
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.matches(name))
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.matches(name))
    }

    /// First matching descendant in document order.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|child| {
            if child.matches(name) {
                Some(child)
            } else {
                child.find(name)
            }
        })
    }

    /// All matching descendants in document order.
    pub fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    /// Non-blank text of every matching descendant.
    pub fn find_all_text(&self, name: &str) -> Vec<String> {
        self.find_all(name)
            .into_iter()
            .filter_map(XmlElement::text_value)
            .map(str::to_string)
            .collect()
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.matches(name) {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// One `<record>` element together with its serialized bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlRecord {
    pub element: XmlElement,
    pub raw: Vec<u8>,
}

impl SourceRecord for XmlRecord {
    fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Lazy iterator over the record elements of an XML stream.
///
/// A record that is not well formed yields
/// [`IngestError::MalformedRecord`] carrying the bytes read for it, and
/// reading resumes after its closing tag. An I/O failure or end of input
/// inside a record yields one error and then ends the stream.
pub struct XmlRecords<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    record_tag: String,
    finished: bool,
}

impl XmlRecords<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestError::open(path, source))?;
        debug!(path = %path.display(), "opened XML source file");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

/// A record found to be broken, read through to its closing tag.
struct Malformed {
    position: u64,
    message: String,
    /// Record elements still open.
    depth: usize,
}

impl<R: BufRead> XmlRecords<R> {
    pub fn from_reader(reader: R) -> Self {
        let mut reader = Reader::from_reader(reader);
        // Mismatched end tags are detected per record instead.
        reader.config_mut().check_end_names = false;
        Self {
            reader,
            buf: Vec::new(),
            record_tag: DEFAULT_RECORD_TAG.to_string(),
            finished: false,
        }
    }

    /// Local name of the element that delimits one record.
    #[must_use]
    pub fn with_record_tag(mut self, tag: &str) -> Self {
        self.record_tag = tag.to_string();
        self
    }

    fn position(&self) -> u64 {
        u64::try_from(self.reader.buffer_position()).unwrap_or(u64::MAX)
    }

    fn xml_error(&self, message: impl ToString) -> IngestError {
        IngestError::Xml {
            position: self.position(),
            message: message.to_string(),
        }
    }

    fn malformed(&self, message: impl ToString, stack: &[XmlElement]) -> Malformed {
        Malformed {
            position: self.position(),
            message: message.to_string(),
            depth: stack
                .iter()
                .filter(|element| element.local_name() == self.record_tag)
                .count(),
        }
    }

    fn next_record(&mut self) -> Result<Option<XmlRecord>> {
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut writer: Option<Writer<Vec<u8>>> = None;
        let mut broken: Option<Malformed> = None;
        loop {
            self.buf.clear();
            let before = self.reader.buffer_position();
            let read = self
                .reader
                .read_event_into(&mut self.buf)
                .map(Event::into_owned);
            let event = match read {
                Ok(event) => event,
                Err(error @ (quick_xml::Error::Io(_) | quick_xml::Error::Syntax(_))) => {
                    return Err(self.xml_error(error));
                }
                Err(error) => {
                    if self.reader.buffer_position() == before {
                        return Err(self.xml_error(error));
                    }
                    if writer.is_some() && broken.is_none() {
                        broken = Some(self.malformed(error, &stack));
                    }
                    continue;
                }
            };
            if let Event::Eof = event {
                if writer.is_none() {
                    return Ok(None);
                }
                return Err(self.xml_error("unexpected end of input inside a record"));
            }

            let opens_record = matches!(
                &event,
                Event::Start(start) | Event::Empty(start) if writer.is_none() && is_tag(start, &self.record_tag)
            );
            if opens_record {
                writer = Some(Writer::new(Vec::new()));
            }
            let Some(out) = writer.as_mut() else {
                continue;
            };
            out.write_event(event.borrow())
                .map_err(|error| self.xml_error(error))?;

            let mut opened = None;
            if broken.is_none() {
                match &event {
                    Event::Start(start) | Event::Empty(start) => match element_from_start(start) {
                        Ok(element) => opened = Some(element),
                        Err(error) => broken = Some(self.malformed(error, &stack)),
                    },
                    Event::End(end) => {
                        let found = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                        let expected = stack.last().map(|element| element.name.as_str());
                        if expected != Some(found.as_str()) {
                            let message = format!(
                                "expected </{}>, found </{found}>",
                                expected.unwrap_or_default()
                            );
                            broken = Some(self.malformed(message, &stack));
                        }
                    }
                    _ => {}
                }
            }

            if let Some(state) = broken.as_mut() {
                match &event {
                    Event::Start(start) if is_tag(start, &self.record_tag) => state.depth += 1,
                    Event::End(end) if end.local_name().as_ref() == self.record_tag.as_bytes() => {
                        state.depth = state.depth.saturating_sub(1);
                    }
                    _ => {}
                }
                if state.depth == 0 {
                    return Err(IngestError::MalformedRecord {
                        position: state.position,
                        message: std::mem::take(&mut state.message),
                        raw: writer.map(Writer::into_inner).unwrap_or_default(),
                    });
                }
                continue;
            }

            match event {
                Event::Start(_) => stack.extend(opened),
                Event::Empty(_) => {
                    let Some(element) = opened else { continue };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(Some(finish(element, writer))),
                    }
                }
                Event::End(_) => {
                    let Some(element) = stack.pop() else {
                        continue;
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(Some(finish(element, writer))),
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&unescaped(&text));
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::GeneralRef(reference) => {
                    if let Some(current) = stack.last_mut() {
                        let name = String::from_utf8_lossy(&reference);
                        match resolve_reference(&name) {
                            Some(resolved) => current.text.push_str(&resolved),
                            None => {
                                current.text.push('&');
                                current.text.push_str(&name);
                                current.text.push(';');
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for XmlRecords<R> {
    type Item = Result<XmlRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                self.finished = !error.is_recoverable();
                Some(Err(error))
            }
        }
    }
}

fn is_tag(start: &BytesStart<'_>, tag: &str) -> bool {
    start.local_name().as_ref() == tag.as_bytes()
}

fn finish(element: XmlElement, writer: Option<Writer<Vec<u8>>>) -> XmlRecord {
    XmlRecord {
        element,
        raw: writer.map(Writer::into_inner).unwrap_or_default(),
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|error| IngestError::Xml {
            position: 0,
            message: error.to_string(),
        })?;
        attributes.push((
            String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
            unescaped(&attribute.value),
        ));
    }
    Ok(XmlElement {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes,
        ..XmlElement::default()
    })
}

fn unescaped(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    match quick_xml::escape::unescape(&text) {
        Ok(value) => value.into_owned(),
        Err(_) => text.into_owned(),
    }
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    quick_xml::escape::resolve_predefined_entity(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_character_and_predefined_references() {
        assert_eq!(resolve_reference("amp").as_deref(), Some("&"));
        assert_eq!(resolve_reference("#233").as_deref(), Some("é"));
        assert_eq!(resolve_reference("#x41").as_deref(), Some("A"));
        assert_eq!(resolve_reference("nbsp"), None);
    }

    #[test]
    fn bare_name_matches_any_prefix() {
        let element = XmlElement {
            name: "dc:title".to_string(),
            ..XmlElement::default()
        };
        assert!(element.matches("title"));
        assert!(element.matches("dc:title"));
        assert!(!element.matches("dcterms:title"));
    }
}
