//! Error types for gruntworker-core.

use std::path::PathBuf;

use thiserror::Error;

/// A commit identifier reported by git that is not 40 hex digits.
///
/// Never retried: a malformed HEAD means the checkout itself is suspect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed commit SHA: {raw:?}")]
pub struct MalformedCommit {
    /// The offending value, decoded lossily.
    pub raw: String,
}

/// All errors that can arise while assembling a [`crate::WorkerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file did not exist at the given path.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A command field was configured as an empty list.
    #[error("`{field}` must name at least a program")]
    EmptyCommand { field: &'static str },

    /// The primary branch name is unusable as a git ref argument.
    #[error("invalid branch name {name:?}")]
    InvalidBranch { name: String },
}
