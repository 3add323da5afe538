//! Transformation pipeline.
//!
//! A [`Transformer`] pulls raw records from a source iterator, asks an
//! [`Extractor`] for their fields, and emits one classified
//! [`DatasetRecord`] per input record.

pub mod citation;
pub mod context;
pub mod dates;
pub mod derive;
pub mod error;
pub mod exclusions;
pub mod extractor;
pub mod outcome;
pub mod pipeline;

pub use citation::synthesize_citation;
pub use context::{RunContext, RunContextBuilder, RunType};
pub use error::{ConfigError, ExtractError, TransformError};
pub use exclusions::ExclusionList;
pub use extractor::{Extraction, Extractor, SourceContext};
pub use outcome::{Action, DatasetRecord, SkipReason};
pub use pipeline::{TransformStats, Transformer};
