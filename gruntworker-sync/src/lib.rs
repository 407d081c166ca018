//! # gruntworker-sync
//!
//! Failure-safe branch synchronization and build-commit protocol.
//!
//! Build a [`Worker`] from a [`gruntworker_core::WorkerConfig`] and call
//! [`Worker::run`]. Every external program is reached through a
//! [`CommandRunner`], so the protocol can be driven by a fake in tests.

pub mod build;
pub mod deps;
pub mod error;
pub mod git;
pub mod runner;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{CommandError, Stage, SyncError};
pub use runner::{Cmd, CommandRunner, ProcessRunner};
pub use worker::{RunOutcome, RunReport, Worker};
