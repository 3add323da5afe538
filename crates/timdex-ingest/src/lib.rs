//! Source record iterators.
//!
//! Each reader turns one harvest file into a lazy, single-pass sequence of
//! raw records. Readers know only their own wire format.

pub mod error;
pub mod json;
pub mod xml;

pub use error::{IngestError, Result};
pub use json::{JsonRecord, JsonRecords};
pub use xml::{XmlElement, XmlRecord, XmlRecords};

/// A raw record as harvested, before any transformation.
pub trait SourceRecord {
    /// Original bytes of the record, retained on every output row.
    fn raw_bytes(&self) -> &[u8];
}
