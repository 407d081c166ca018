//! Error types for gruntworker-sync.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use gruntworker_core::MalformedCommit;

/// Failure of a single external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An argument vector with no program in it.
    #[error("empty command")]
    Empty,

    /// The program could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("`{command}` failed ({})", describe_exit(.code))]
    Failed { command: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_owned(),
    }
}

/// Step after the branch sync whose failure is recovered by rolling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Dependencies,
    Build,
    Status,
    Commit,
    Push,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Dependencies => "dependency install",
            Stage::Build => "build",
            Stage::Status => "status",
            Stage::Commit => "commit",
            Stage::Push => "push",
        })
    }
}

/// All errors that can arise from a worker run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// HEAD did not resolve to a 40-hex-digit commit.
    #[error(transparent)]
    MalformedCommit(#[from] MalformedCommit),

    /// `git rev-parse HEAD` itself failed.
    #[error("could not read HEAD: {0}")]
    Head(#[source] CommandError),

    #[error("fetch from {remote} failed: {source}")]
    Fetch {
        remote: String,
        #[source]
        source: CommandError,
    },

    /// Moving the primary branch to `target` failed.
    #[error("could not set {branch} to {target}: {source}")]
    BranchUpdate {
        branch: String,
        target: String,
        #[source]
        source: CommandError,
    },

    #[error("no dependency manifest found (looked for {})", display_paths(.candidates))]
    ManifestMissing { candidates: Vec<PathBuf> },

    /// Copying the manifest into the repository root failed.
    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    ManifestCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A post-sync step failed; recoverable by rolling back.
    #[error("{stage} failed: {source}")]
    Step {
        stage: Stage,
        #[source]
        source: CommandError,
    },

    /// Rolling back after `cause` failed too.
    #[error("rollback to {target} failed: {source} (after: {cause})")]
    Rollback {
        target: String,
        #[source]
        source: CommandError,
        cause: Box<SyncError>,
    },
}

impl SyncError {
    /// The step this error is attributed to, if it triggers a rollback.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SyncError::Step { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience constructor for [`SyncError::Step`].
pub(crate) fn step_err(stage: Stage) -> impl FnOnce(CommandError) -> SyncError {
    move |source| SyncError::Step { stage, source }
}
