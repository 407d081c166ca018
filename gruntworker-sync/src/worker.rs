//! Synchronization Orchestrator.
//!
//! ## `Worker::run` — protocol
//!
//! 1. Checkpoint: read and validate HEAD.
//! 2. Fetch the primary branch into `FETCH_HEAD`. Failure is fatal.
//! 3. Force the primary branch and working tree to `FETCH_HEAD`. On failure,
//!    check the branch back out by name and stop.
//! 4. Read HEAD again. Equal to the checkpoint → done, nothing is built.
//! 5. Install dependencies and build.
//! 6. Commit the modified tracked files and push, unless none changed.
//!    The new HEAD is read back so the report names the pushed commit.
//! 7. Any failure in 5–6 after the manifest is staged resets the branch to
//!    the commit from step 4. The run ends `RolledBack`.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use gruntworker_core::{BranchName, CommitSha, WorkerConfig, FETCH_HEAD};

use crate::build::run_build;
use crate::deps::install_dependencies;
use crate::error::{step_err, Stage, SyncError};
use crate::git::{commit_message, Git};
use crate::runner::{CommandRunner, ProcessRunner};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Terminal state of a run that did not hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The fetch brought nothing new.
    Unchanged { head: CommitSha },
    /// Built, but the build left every tracked file untouched.
    NothingToCommit { head: CommitSha },
    /// Built output was committed on top of `previous` and pushed as `head`.
    Pushed {
        previous: CommitSha,
        head: CommitSha,
        files: Vec<String>,
    },
    /// A post-sync step failed and the branch was reset to `head`.
    RolledBack {
        head: CommitSha,
        stage: Stage,
        error: String,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::RolledBack { .. })
    }

    /// The commit the branch was left at.
    pub fn head(&self) -> &CommitSha {
        match self {
            RunOutcome::Unchanged { head }
            | RunOutcome::NothingToCommit { head }
            | RunOutcome::Pushed { head, .. }
            | RunOutcome::RolledBack { head, .. } => head,
        }
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub branch: BranchName,
    pub checkpoint: CommitSha,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Runs the sync/build/push protocol once against a single checkout.
pub struct Worker<R = ProcessRunner> {
    config: WorkerConfig,
    runner: R,
}

impl Worker<ProcessRunner> {
    /// A worker spawning real processes in `config.repo_root`.
    pub fn new(config: WorkerConfig) -> Self {
        let runner = ProcessRunner::new(&config.repo_root);
        Self { config, runner }
    }
}

impl<R: CommandRunner> Worker<R> {
    pub fn with_runner(config: WorkerConfig, runner: R) -> Self {
        Self { config, runner }
    }

    fn git(&self) -> Git<'_, R> {
        Git::new(&self.runner)
    }

    fn branch(&self) -> &BranchName {
        &self.config.primary_branch
    }

    /// Execute the full protocol.
    ///
    /// `Err` is fatal; `Ok` carries the terminal state, which may still be a
    /// rollback (see [`RunOutcome::is_success`]).
    pub fn run(&self) -> Result<RunReport, SyncError> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let checkpoint = self.head_commit()?;
        self.fetch()?;
        self.sync_to_fetched()?;
        let head = self.head_commit()?;

        let outcome = if head == checkpoint {
            tracing::info!("Fetch didn't change HEAD commit; Done.");
            RunOutcome::Unchanged { head }
        } else {
            tracing::info!(
                "{} moved {} -> {}",
                self.branch(),
                checkpoint.short(),
                head.short()
            );
            self.build_and_publish(head)?
        };

        Ok(RunReport {
            branch: self.branch().clone(),
            checkpoint,
            outcome,
            started_at,
            duration_ms: clock.elapsed().as_millis(),
        })
    }

    fn head_commit(&self) -> Result<CommitSha, SyncError> {
        self.git().head_commit().map_err(|e| {
            if let SyncError::MalformedCommit(bad) = &e {
                tracing::error!("Got malformed commit SHA for HEAD: {}", bad.raw);
                tracing::error!("Exiting due to insanity; Failed!");
            }
            e
        })
    }

    fn fetch(&self) -> Result<(), SyncError> {
        let remote = &self.config.remote;
        tracing::info!("Fetching from {remote}...");
        self.git().fetch(remote, self.branch()).map_err(|source| {
            tracing::error!("Error fetching from {remote}; Failed!");
            SyncError::Fetch {
                remote: remote.clone(),
                source,
            }
        })
    }

    fn sync_to_fetched(&self) -> Result<(), SyncError> {
        self.update_branch(FETCH_HEAD).map_err(|e| {
            self.restore_branch_checkout();
            e
        })
    }

    /// Force the primary branch and checkout to `target`.
    fn update_branch(&self, target: &str) -> Result<(), SyncError> {
        let branch = self.branch();
        tracing::info!("Setting local {branch} to {target}...");
        self.git()
            .reset_branch(branch, target)
            .map_err(|source| {
                tracing::error!("Error setting local {branch} to {target}!");
                SyncError::BranchUpdate {
                    branch: branch.to_string(),
                    target: target.to_owned(),
                    source,
                }
            })
    }

    /// Last resort after a failed branch update: check the branch out by name.
    fn restore_branch_checkout(&self) {
        let branch = self.branch();
        tracing::info!("Attempting to reset current checkout & branch to local {branch}...");
        if let Err(e) = self.git().reset_branch(branch, branch.as_str()) {
            tracing::error!("Error forcibly checking out {branch}: {e}; Failed!");
        }
    }

    fn build_and_publish(&self, head: CommitSha) -> Result<RunOutcome, SyncError> {
        match self.publish(&head) {
            Ok(outcome) => Ok(outcome),
            Err(err) => match err.stage() {
                Some(stage) => self.roll_back(head, stage, err),
                None => Err(err),
            },
        }
    }

    fn publish(&self, head: &CommitSha) -> Result<RunOutcome, SyncError> {
        install_dependencies(&self.runner, &self.config)?;
        run_build(&self.runner, &self.config)?;

        let git = self.git();
        let modified = git.modified_files()?;
        if modified.is_empty() {
            tracing::info!("No files modified by build; Done.");
            return Ok(RunOutcome::NothingToCommit { head: head.clone() });
        }

        git.add(&modified).map_err(step_err(Stage::Commit))?;
        git.commit(&commit_message(&self.config.commit_tag))
            .map_err(step_err(Stage::Commit))?;
        let committed = self.head_commit().map_err(|e| match e {
            SyncError::Head(source) => step_err(Stage::Commit)(source),
            other => other,
        })?;

        let remote = &self.config.remote;
        tracing::info!("Pushing to {remote}...");
        git.push(remote, self.branch()).map_err(|e| {
            tracing::error!("Error pushing to {remote}!");
            step_err(Stage::Push)(e)
        })?;

        tracing::info!("Successfully pushed changes; Done.");
        Ok(RunOutcome::Pushed {
            previous: head.clone(),
            head: committed,
            files: modified
                .iter()
                .map(|p| String::from_utf8_lossy(p).into_owned())
                .collect(),
        })
    }

    /// Reset to the post-fetch commit, keeping the fetched history.
    fn roll_back(
        &self,
        head: CommitSha,
        stage: Stage,
        cause: SyncError,
    ) -> Result<RunOutcome, SyncError> {
        tracing::info!(
            "Resetting {} branch & checkout back to commit {head} ...",
            self.branch()
        );
        match self.update_branch(head.as_str()) {
            Ok(()) => {
                tracing::error!("{cause}; Failed!");
                Ok(RunOutcome::RolledBack {
                    head,
                    stage,
                    error: cause.to_string(),
                })
            }
            Err(SyncError::BranchUpdate { target, source, .. }) => {
                self.restore_branch_checkout();
                Err(SyncError::Rollback {
                    target,
                    source,
                    cause: Box::new(cause),
                })
            }
            Err(other) => Err(other),
        }
    }
}
