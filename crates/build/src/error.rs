//! Error taxonomy for the packing pipeline
//!
//! Every failure is fatal: errors propagate to the binary, which reports them
//! and exits with a non-zero status. Nothing is retried.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Result alias used throughout the crate
pub type Result<T, E = PackError> = std::result::Result<T, E>;

/// Errors that abort a packing run
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// A file or directory could not be read, written, copied or removed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation was acting on
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The build manifest is not valid YAML for [`crate::Manifest`]
    #[error("invalid build manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_norway::Error,
    },

    /// A JSON input (constants, graphics declarations) is malformed
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A bounded name pool cannot satisfy the number of names requested
    #[error("not enough names in pool `{pool}`: {requested} requested but only {available} left")]
    NamePoolExhausted { pool: &'static str, requested: usize, available: usize },

    /// An external tool could not be located or spawned
    #[error("{tool} is not available: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool ran and exited abnormally
    #[error("{tool} failed with {status}: {stderr}")]
    ToolFailed { tool: String, status: ExitStatus, stderr: String },

    /// The JS compressor ran but produced something that is not usable source text
    #[error("minifier produced no usable output for {bundle}")]
    MinifierOutput { bundle: String },

    /// An embedded song literal could not be parsed
    #[error("malformed song literal at byte {offset}: {message}")]
    SongLiteral { offset: usize, message: String },

    /// A song literal parsed but does not have the expected song structure
    #[error("song literal has an unexpected shape: {0}")]
    SongShape(#[source] serde_json::Error),

    /// A graphics member is referenced that the declarations table does not list
    #[error("graphics member `{0}` is missing from the declarations table")]
    UnknownGraphicsMember(String),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

impl PackError {
    /// Wraps an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
