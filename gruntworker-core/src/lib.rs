//! Gruntworker core library: domain types, worker configuration, errors.
//!
//! Public API surface:
//! - [`types`] — [`CommitSha`] and [`BranchName`] newtypes
//! - [`config`] — [`WorkerConfig`] and its YAML overrides
//! - [`error`] — [`ConfigError`], [`MalformedCommit`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigFile, WorkerConfig};
pub use error::{ConfigError, MalformedCommit};
pub use types::{BranchName, CommitSha, FETCH_HEAD};
