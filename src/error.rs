use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the clustering library
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("malformed document '{filename}': expected 2 header lines, found {header_lines}")]
    MalformedDocument { filename: String, header_lines: usize },

    #[error("duplicate document '{0}' in corpus")]
    DuplicateDocument(String),

    #[error("corpus contains no documents")]
    EmptyCorpus,

    #[error("vocabulary is empty after normalization")]
    EmptyVocabulary,

    #[error("invalid cluster count {k} for {documents} documents")]
    InvalidClusterCount { k: usize, documents: usize },

    #[error("row '{label}' is not L2-normalized (norm {norm})")]
    NotNormalized { label: String, norm: f64 },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding failed")]
    Snapshot(#[from] bincode::Error),

    #[error("json encoding failed")]
    Json(#[from] serde_json::Error),

    #[error("k-means failed: {0}")]
    KMeans(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClusterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
