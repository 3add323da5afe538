use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read source registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse source registry {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid source registry entry '{code}': {message}")]
    InvalidEntry { code: String, message: String },

    #[error("unknown source '{code}', expected one of: {known}")]
    UnknownSource { code: String, known: String },

    #[error("source '{code}' uses the '{extractor}' extractor, which is not available")]
    UnsupportedExtractor { code: String, extractor: String },
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
