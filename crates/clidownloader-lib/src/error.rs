use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliDownloaderError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation failed: {details}")]
    ConfigValidation { details: String },

    #[error("CLI argument validation failed: {details}")]
    CliArgumentValidation { details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Archive verification failed for {url}: {source}")]
    ChecksumMismatch {
        url: String,
        #[source]
        source: crate::verification::VerificationError,
    },

    #[error("Failed to open archive {path}: {reason}")]
    ArchiveOpenFailed { path: PathBuf, reason: String },

    #[error("Archive entry {entry} resolves to a path outside of {root}")]
    PathTraversal { entry: String, root: PathBuf },

    #[error("Extraction destination {path} must be an absolute path")]
    InvalidDestination { path: PathBuf },

    #[error("Failed to extract {entry} to {path}: {reason}")]
    ExtractionFailed {
        entry: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Archive entry {entry} exceeds the extraction limit of {limit} bytes")]
    SizeLimitExceeded { entry: String, limit: u64 },

    #[error("{path} is not executable: {reason}")]
    NotExecutable { path: PathBuf, reason: String },

    #[error("{path} did not finish within {timeout:?}")]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("{path} exited with {status}: {output}")]
    ProbeFailed {
        path: PathBuf,
        status: String,
        output: String,
    },

    #[error("Failed to parse version output of {path}: {reason}")]
    VersionParseFailed { path: PathBuf, reason: String },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
