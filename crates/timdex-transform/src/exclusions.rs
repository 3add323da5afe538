use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;

/// Source links whose records are skipped as excluded.
///
/// File format: one link per line, blank lines and `#` comments ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    links: HashSet<String>,
}

impl ExclusionList {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ExclusionList {
            path: path.to_path_buf(),
            source,
        })?;
        let list = Self::parse(&contents);
        debug!(path = %path.display(), entries = list.len(), "loaded exclusion list");
        Ok(list)
    }

    pub fn parse(contents: &str) -> Self {
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    pub fn contains(&self, source_link: &str) -> bool {
        self.links.contains(source_link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().map(Into::into).collect(),
        }
    }
}
