//! Typed git commands issued through a [`CommandRunner`].

use gruntworker_core::{BranchName, CommitSha};

use crate::error::{step_err, CommandError, Stage, SyncError};
use crate::runner::{Cmd, CommandRunner};

/// Trailer that tells CI not to build automation commits.
pub const CI_SKIP_TRAILER: &str = "[ci skip]";

/// Full message for an automation commit tagged `tag`.
pub fn commit_message(tag: &str) -> String {
    format!("{tag}\n\n{CI_SKIP_TRAILER}")
}

/// Git porcelain over a borrowed runner.
pub struct Git<'r, R: ?Sized> {
    runner: &'r R,
}

impl<'r, R: CommandRunner + ?Sized> Git<'r, R> {
    pub fn new(runner: &'r R) -> Self {
        Self { runner }
    }

    /// `git rev-parse HEAD`, validated.
    pub fn head_commit(&self) -> Result<CommitSha, SyncError> {
        let out = self
            .runner
            .output(&git().args(["rev-parse", "HEAD"]))
            .map_err(SyncError::Head)?;
        Ok(CommitSha::parse(&out)?)
    }

    /// Fetch `branch` from `remote` into `FETCH_HEAD`; no local branch moves.
    pub fn fetch(&self, remote: &str, branch: &BranchName) -> Result<(), CommandError> {
        let refspec = format!("+{branch}");
        self.runner
            .run(&git().args(["fetch", remote, refspec.as_str()]))
    }

    pub fn checkout_force(&self, target: &str) -> Result<(), CommandError> {
        self.runner
            .run(&git().args(["checkout", "-q", "-f", target]))
    }

    pub fn force_branch(&self, branch: &BranchName, target: &str) -> Result<(), CommandError> {
        self.runner
            .run(&git().args(["branch", "-f", branch.as_str(), target]))
    }

    /// Point `branch` and the working tree at `target`, discarding local edits.
    ///
    /// Checkout detached first, since a checked-out branch cannot be forced.
    /// When `target` is the branch itself only the checkout is needed.
    pub fn reset_branch(&self, branch: &BranchName, target: &str) -> Result<(), CommandError> {
        self.checkout_force(target)?;
        if target == branch.as_str() {
            return Ok(());
        }
        self.force_branch(branch, target)?;
        self.checkout_force(branch.as_str())
    }

    /// Tracked, non-submodule paths git reports as modified in the worktree.
    pub fn modified_files(&self) -> Result<Vec<Vec<u8>>, SyncError> {
        let out = self
            .runner
            .output(&git().args(["status", "-z", "-uno", "--ignore-submodules=all"]))
            .map_err(step_err(Stage::Status))?;
        Ok(parse_modified(&out))
    }

    /// `git add -- <paths>`.
    pub fn add(&self, paths: &[Vec<u8>]) -> Result<(), CommandError> {
        self.runner.run(&git().args(["add", "--"]).args(paths))
    }

    pub fn commit(&self, message: &str) -> Result<(), CommandError> {
        self.runner.run(&git().args(["commit", "-m", message]))
    }

    pub fn push(&self, remote: &str, branch: &BranchName) -> Result<(), CommandError> {
        self.runner
            .run(&git().args(["push", remote, branch.as_str()]))
    }
}

fn git() -> Cmd {
    Cmd::new("git")
}

/// Parse `git status -z` output: `XY<space><path>` records separated by NUL.
fn parse_modified(out: &[u8]) -> Vec<Vec<u8>> {
    out.split(|b| *b == 0)
        .filter(|entry| entry.len() > 3 && entry.starts_with(b" M"))
        .map(|entry| entry[3..].to_vec())
        .collect()
}
