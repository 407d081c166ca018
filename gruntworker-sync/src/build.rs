//! Build step: regenerate distributable files in the working tree.

use gruntworker_core::WorkerConfig;

use crate::error::{step_err, Stage, SyncError};
use crate::runner::{Cmd, CommandRunner};

/// Run the configured build command once. Failure is returned, never swallowed.
pub fn run_build<R>(runner: &R, config: &WorkerConfig) -> Result<(), SyncError>
where
    R: CommandRunner + ?Sized,
{
    tracing::info!("Building...");
    runner
        .run(&Cmd::from_argv(&config.build_command))
        .map_err(|e| {
            tracing::error!("Error while building!");
            step_err(Stage::Build)(e)
        })
}
