//! Normalized TIMDEX record model.
//!
//! Every source format is transformed into a [`NormalizedRecord`]: four
//! required fields plus a large set of optional, repeatable substructures.
//! Invariants are enforced when the record is built, so a record that
//! exists is always valid.

pub mod dedupe;
pub mod error;
pub mod fields;
pub mod provenance;
pub mod record;

pub use dedupe::dedupe;
pub use error::{Result, ValidationError};
pub use fields::{
    AlternateTitle, Contributor, Date, DateRange, Funder, Holding, Identifier, Link, Location,
    Note, Publisher, RelatedItem, Rights, Subject,
};
pub use provenance::TimdexProvenance;
pub use record::{NormalizedRecord, OptionalFields, RequiredFields, TITLE_NOT_PROVIDED, extend_field};
