//! Error types for evscan

use std::path::PathBuf;

use thiserror::Error;

/// evscan error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// An input file could not be opened. Fatal for the whole run.
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The stream header of an input file is missing or malformed.
    #[error("bad stream header in '{}': {reason}", path.display())]
    BadHeader {
        /// File with the bad header.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Reading a line of an input file failed after it was opened.
    #[error("{}:{line}: read failed: {source}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An event record could not be decoded.
    #[error("{}:{line}: {source}", path.display())]
    Decode {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },

    /// An event does not carry a collection the analysis needs.
    #[error("event {event}: missing collection '{collection}'")]
    MissingCollection {
        /// Requested collection name.
        collection: String,
        /// Event number.
        event: u64,
    },

    /// A collection exists but holds a different record kind.
    #[error("collection '{collection}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Collection name.
        collection: String,
        /// Kind the caller asked for.
        expected: &'static str,
        /// Kind actually stored.
        found: &'static str,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The run was cancelled before all files completed.
    #[error("run cancelled")]
    Cancelled,

    /// A worker terminated abnormally.
    #[error("worker for '{}' failed: {reason}", path.display())]
    Worker {
        /// File the worker was processing.
        path: PathBuf,
        /// Panic payload or other description.
        reason: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
