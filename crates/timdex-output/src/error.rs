use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build dataset batch: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("failed to encode dataset row: {0}")]
    Json(#[from] serde_json::Error),

    #[error("writer already finished")]
    Finished,
}

impl OutputError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
