//! Dependency staging: copy the manifest into place, prune, install.
//!
//! The staged copy at `<repo_root>/<manifest_filename>` lives exactly as long
//! as a [`StagedManifest`] guard, so it is removed on every exit path.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gruntworker_core::WorkerConfig;

use crate::error::{step_err, Stage, SyncError};
use crate::runner::{Cmd, CommandRunner};

/// A manifest copied into the repository root; removed on drop.
#[derive(Debug)]
pub struct StagedManifest {
    path: PathBuf,
}

impl StagedManifest {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedManifest {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(
                "Error deleting staged copy of {}: {e}",
                self.path.display()
            );
        }
    }
}

/// Copy the first existing manifest candidate to the repository root.
pub fn stage_manifest(config: &WorkerConfig) -> Result<StagedManifest, SyncError> {
    let candidates = config.manifest_candidates();
    let Some(source) = candidates.iter().find(|p| p.is_file()) else {
        tracing::error!("No {} found to copy into place!", config.manifest_filename);
        return Err(SyncError::ManifestMissing { candidates });
    };

    let dest = config.staged_manifest_path();
    if let Err(e) = fs::copy(source, &dest) {
        tracing::error!("Error copying {} into place!", source.display());
        discard_partial_copy(&dest);
        return Err(SyncError::ManifestCopy {
            from: source.clone(),
            to: dest,
            source: e,
        });
    }
    tracing::debug!("staged {} -> {}", source.display(), dest.display());
    Ok(StagedManifest { path: dest })
}

/// Best-effort removal of a copy that failed partway.
fn discard_partial_copy(dest: &Path) {
    match fs::remove_file(dest) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Error deleting partial copy {}: {e}", dest.display()),
    }
}

/// Stage the manifest, then prune and install.
///
/// A failed prune or install purges the dependency directory before the
/// error is returned. The staged manifest is always removed.
pub fn install_dependencies<R>(runner: &R, config: &WorkerConfig) -> Result<(), SyncError>
where
    R: CommandRunner + ?Sized,
{
    let _staged = stage_manifest(config)?;

    tracing::info!("Pruning unnecessary dependencies...");
    let result = runner
        .run(&Cmd::from_argv(&config.prune_command))
        .and_then(|()| {
            tracing::info!(
                "Installing/updating dependencies per {} ...",
                config.manifest_filename
            );
            runner.run(&Cmd::from_argv(&config.install_command))
        });

    if let Err(e) = result {
        tracing::error!("Error installing dependencies: {e}");
        purge_dependency_dir(&config.repo_root.join(&config.dependency_dir));
        return Err(step_err(Stage::Dependencies)(e));
    }
    Ok(())
}

/// Best-effort removal of a half-installed dependency tree.
fn purge_dependency_dir(dir: &Path) {
    tracing::info!("Purging {} due to errors.", dir.display());
    match fs::remove_dir_all(dir) {
        Ok(()) => tracing::info!("Successfully purged {}.", dir.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Error purging {}: {e}", dir.display()),
    }
}
