use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `transform` (or anything needing a vocabulary) was called before `fit`.
    #[error("pre-processor must be fitted before it can transform documents")]
    NotFitted,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Documents and labels disagree, or the data cannot produce features.
    #[error("data shape error: {0}")]
    DataShape(String),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV records")]
    Csv(#[from] csv::Error),

    #[error("failed to parse JSON records")]
    Json(#[from] serde_json::Error),

    #[error("unsupported data file extension: {0}")]
    UnsupportedFormat(String),

    #[cfg(feature = "bincode")]
    #[error("failed to encode pre-processor")]
    Encode(#[from] bincode::error::EncodeError),

    #[cfg(feature = "bincode")]
    #[error("failed to decode pre-processor")]
    Decode(#[from] bincode::error::DecodeError),
}
