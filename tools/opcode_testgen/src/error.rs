use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TestgenError>;

/// Fatal errors raised while generating the opcode test suite.
///
/// A non-success HTTP status is not represented here: the fetch layer reports it as "not
/// available" and the dependent entry is dropped. Everything below aborts the run.
#[derive(Debug, Error)]
pub enum TestgenError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("GET {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to decompress {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid qualified opcode name {0:?}")]
    InvalidQualifiedName(String),

    #[error("opcode index {} is not available from the remote corpus", path.display())]
    MissingIndex { path: PathBuf },

    #[error("quirk opcode {opcode} is composite but has no reg[\"0\"] entry")]
    MalformedQuirk { opcode: String },
}

impl TestgenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
