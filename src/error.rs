use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single call to the remote media service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to read '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The transfer succeeded but tagging the new media into the collection did not.
    #[error("collection assignment failed: {0}")]
    Assignment(#[source] Box<ServiceError>),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("failed to inspect '{}': {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}
