//! Format-specific [`Extractor`](timdex_transform::Extractor) implementations.

mod aardvark;
mod mitlibwebsite;
mod oaidc;
mod springshare;

pub use aardvark::MitAardvark;
pub use mitlibwebsite::MitLibWebsite;
pub use oaidc::OaiDc;
pub use springshare::SpringshareOaiDc;

/// `None` for an empty list.
fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    Some(items).filter(|items| !items.is_empty())
}
