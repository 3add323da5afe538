//! Source registry and format-specific extractors.

pub mod error;
pub mod extractors;
pub mod registry;

pub use error::RegistryError;
pub use extractors::{MitAardvark, MitLibWebsite, OaiDc, SpringshareOaiDc};
pub use registry::{ExtractorKind, SourceEntry, SourceRegistry};
