//! Source registry: source code to display name, base URL and extractor.
//!
//! The default registry is compiled in from `sources.toml`. A replacement
//! file with the same layout can be loaded at runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use timdex_transform::{RunContext, SourceContext};

use crate::error::RegistryError;

const DEFAULT_SOURCES: &str = include_str!("sources.toml");

/// Field extraction used for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    OaiDc,
    SpringshareOaiDc,
    MitLibWebsite,
    MitAardvark,
    Marc,
    Ead,
    DspaceMets,
    Datacite,
}

impl ExtractorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OaiDc => "oai_dc",
            Self::SpringshareOaiDc => "springshare_oai_dc",
            Self::MitLibWebsite => "mit_lib_website",
            Self::MitAardvark => "mit_aardvark",
            Self::Marc => "marc",
            Self::Ead => "ead",
            Self::DspaceMets => "dspace_mets",
            Self::Datacite => "datacite",
        }
    }

    /// Whether an extractor for this format is built in.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Self::OaiDc | Self::SpringshareOaiDc | Self::MitLibWebsite | Self::MitAardvark
        )
    }

    /// Records arrive as XML (`true`) or JSON Lines (`false`).
    pub fn reads_xml(self) -> bool {
        !matches!(self, Self::MitLibWebsite | Self::MitAardvark)
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub name: String,
    pub base_url: String,
    pub extractor: ExtractorKind,
    /// Lowercased content types that cause a record to be skipped.
    #[serde(default)]
    pub invalid_content_types: Vec<String>,
    /// Element wrapping each record in XML harvests. Defaults to `record`.
    #[serde(default)]
    pub record_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    sources: BTreeMap<String, SourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: BTreeMap<String, SourceEntry>,
}

impl SourceRegistry {
    /// The compiled-in registry.
    pub fn load_default() -> Result<Self, RegistryError> {
        Self::from_toml_str(DEFAULT_SOURCES, "built-in registry")
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| RegistryError::io(path, source))?;
        let registry = Self::from_toml_str(&contents, &path.display().to_string())?;
        debug!(path = %path.display(), sources = registry.len(), "loaded source registry");
        Ok(registry)
    }

    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(contents).map_err(|source| RegistryError::Toml {
            origin: origin.to_string(),
            source,
        })?;
        for (code, entry) in &file.sources {
            validate_entry(code, entry)?;
        }
        Ok(Self {
            sources: file.sources,
        })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceEntry)> {
        self.sources
            .iter()
            .map(|(code, entry)| (code.as_str(), entry))
    }

    pub fn get(&self, code: &str) -> Result<&SourceEntry, RegistryError> {
        self.sources
            .get(code)
            .ok_or_else(|| RegistryError::UnknownSource {
                code: code.to_string(),
                known: self.sources.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }

    /// Look up the run's source and check that it can be transformed.
    pub fn source_context(
        &self,
        run: RunContext,
    ) -> Result<(SourceContext, SourceEntry), RegistryError> {
        let entry = self.get(&run.source)?;
        if !entry.extractor.is_supported() {
            return Err(RegistryError::UnsupportedExtractor {
                code: run.source.clone(),
                extractor: entry.extractor.to_string(),
            });
        }
        let context = SourceContext::new(
            run.source.clone(),
            entry.name.clone(),
            entry.base_url.clone(),
            run,
        );
        Ok((context, entry.clone()))
    }
}

fn validate_entry(code: &str, entry: &SourceEntry) -> Result<(), RegistryError> {
    let invalid = |message: &str| RegistryError::InvalidEntry {
        code: code.to_string(),
        message: message.to_string(),
    };
    if code.trim().is_empty() || code.contains(':') {
        return Err(invalid("source codes must be non-empty and contain no ':'"));
    }
    if entry.name.trim().is_empty() {
        return Err(invalid("name must not be blank"));
    }
    if entry
        .invalid_content_types
        .iter()
        .any(|content_type| *content_type != content_type.to_lowercase())
    {
        return Err(invalid("invalid_content_types must be lowercase"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_lists_every_source() {
        let registry = SourceRegistry::load_default().unwrap();
        let codes: Vec<&str> = registry.iter().map(|(code, _)| code).collect();
        assert_eq!(
            codes,
            vec![
                "alma",
                "aspace",
                "dspace",
                "gismit",
                "gisogm",
                "jpal",
                "libguides",
                "mitlibwebsite",
                "researchdatabases",
                "whoas",
                "zenodo",
            ]
        );
        let whoas = registry.get("whoas").unwrap();
        assert_eq!(whoas.extractor, ExtractorKind::OaiDc);
        assert!(whoas.invalid_content_types.contains(&"thesis".to_string()));
    }

    #[test]
    fn unknown_code_lists_known_sources() {
        let registry = SourceRegistry::from_toml_str(
            "[sources.a]\nname = \"A\"\nbase_url = \"https://a/\"\nextractor = \"oai_dc\"\n",
            "test",
        )
        .unwrap();
        let error = registry.get("b").unwrap_err();
        assert_eq!(error.to_string(), "unknown source 'b', expected one of: a");
    }

    #[test]
    fn uppercase_invalid_content_types_are_rejected() {
        let error = SourceRegistry::from_toml_str(
            "[sources.a]\nname = \"A\"\nbase_url = \"\"\nextractor = \"oai_dc\"\ninvalid_content_types = [\"Thesis\"]\n",
            "test",
        )
        .unwrap_err();
        assert!(matches!(error, RegistryError::InvalidEntry { .. }));
    }
}
