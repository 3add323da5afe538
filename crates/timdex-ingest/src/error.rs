use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open source file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read source stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("malformed record at byte {position}: {message}")]
    MalformedRecord {
        position: u64,
        message: String,
        raw: Vec<u8>,
    },

    #[error("malformed JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
        raw: Vec<u8>,
    },

    #[error("line {line} is not a JSON object")]
    NotAnObject { line: usize, raw: Vec<u8> },
}

impl IngestError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Bytes of a single record that could not be parsed.
    ///
    /// `Some` means the stream is still readable and later records follow.
    pub fn record_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::MalformedRecord { raw, .. }
            | Self::Json { raw, .. }
            | Self::NotAnObject { raw, .. } => Some(raw),
            Self::Open { .. } | Self::Io(_) | Self::Xml { .. } => None,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.record_bytes().is_some()
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
