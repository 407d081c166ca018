//! Worker configuration.
//!
//! A [`WorkerConfig`] is built from the CLI (repository root + primary branch)
//! and optionally overlaid with a YAML [`ConfigFile`]:
//!
//! ```yaml
//! remote: upstream
//! manifest_dirs: [grunt, test-infra]
//! build_command: [grunt, dist]
//! ```
//!
//! Every key is optional; unknown keys are rejected so typos surface at load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::BranchName;

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_MANIFEST_FILENAME: &str = "npm-shrinkwrap.json";
pub const DEFAULT_MANIFEST_DIRS: &[&str] = &["grunt", "test-infra"];
pub const DEFAULT_DEPENDENCY_DIR: &str = "node_modules";
pub const DEFAULT_PRUNE_COMMAND: &[&str] = &["npm", "prune"];
pub const DEFAULT_INSTALL_COMMAND: &[&str] = &["npm", "install"];
pub const DEFAULT_BUILD_COMMAND: &[&str] = &["grunt", "dist", "clean:docs", "copy:docs"];
pub const DEFAULT_COMMIT_TAG: &str = "automatic `grunt dist`";

// ---------------------------------------------------------------------------
// WorkerConfig
// ---------------------------------------------------------------------------

/// Everything one run needs to know about its surroundings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerConfig {
    /// Root of the git checkout; every command runs here.
    pub repo_root: PathBuf,
    pub remote: String,
    pub primary_branch: BranchName,
    /// File name of the dependency manifest, both in its staging dir and at the root.
    pub manifest_filename: String,
    /// Staging directories (relative to `repo_root`), highest priority first.
    pub manifest_dirs: Vec<PathBuf>,
    /// Installed-dependency directory purged after a failed install.
    pub dependency_dir: PathBuf,
    pub prune_command: Vec<String>,
    pub install_command: Vec<String>,
    pub build_command: Vec<String>,
    /// First line of every automation commit.
    pub commit_tag: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl WorkerConfig {
    /// Defaults for a checkout at `repo_root` tracking `primary_branch`.
    pub fn new(repo_root: impl Into<PathBuf>, primary_branch: BranchName) -> Self {
        Self {
            repo_root: repo_root.into(),
            remote: DEFAULT_REMOTE.to_owned(),
            primary_branch,
            manifest_filename: DEFAULT_MANIFEST_FILENAME.to_owned(),
            manifest_dirs: DEFAULT_MANIFEST_DIRS.iter().map(PathBuf::from).collect(),
            dependency_dir: PathBuf::from(DEFAULT_DEPENDENCY_DIR),
            prune_command: owned(DEFAULT_PRUNE_COMMAND),
            install_command: owned(DEFAULT_INSTALL_COMMAND),
            build_command: owned(DEFAULT_BUILD_COMMAND),
            commit_tag: DEFAULT_COMMIT_TAG.to_owned(),
        }
    }

    /// Overlay the keys present in `file`.
    pub fn apply(&mut self, file: ConfigFile) -> Result<(), ConfigError> {
        let ConfigFile {
            remote,
            manifest_filename,
            manifest_dirs,
            dependency_dir,
            prune_command,
            install_command,
            build_command,
            commit_tag,
        } = file;

        if let Some(remote) = remote {
            self.remote = remote;
        }
        if let Some(name) = manifest_filename {
            self.manifest_filename = name;
        }
        if let Some(dirs) = manifest_dirs {
            self.manifest_dirs = dirs;
        }
        if let Some(dir) = dependency_dir {
            self.dependency_dir = dir;
        }
        if let Some(cmd) = prune_command {
            self.prune_command = non_empty("prune_command", cmd)?;
        }
        if let Some(cmd) = install_command {
            self.install_command = non_empty("install_command", cmd)?;
        }
        if let Some(cmd) = build_command {
            self.build_command = non_empty("build_command", cmd)?;
        }
        if let Some(tag) = commit_tag {
            self.commit_tag = tag;
        }
        Ok(())
    }

    /// `<repo_root>/<manifest_filename>` — where the manifest is staged.
    pub fn staged_manifest_path(&self) -> PathBuf {
        self.repo_root.join(&self.manifest_filename)
    }

    /// Candidate manifest locations in priority order.
    pub fn manifest_candidates(&self) -> Vec<PathBuf> {
        self.manifest_dirs
            .iter()
            .map(|dir| self.repo_root.join(dir).join(&self.manifest_filename))
            .collect()
    }
}

fn non_empty(field: &'static str, cmd: Vec<String>) -> Result<Vec<String>, ConfigError> {
    if cmd.is_empty() {
        return Err(ConfigError::EmptyCommand { field });
    }
    Ok(cmd)
}

// ---------------------------------------------------------------------------
// ConfigFile
// ---------------------------------------------------------------------------

/// On-disk overrides. `repo_root` and the branch always come from the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub remote: Option<String>,
    pub manifest_filename: Option<String>,
    pub manifest_dirs: Option<Vec<PathBuf>>,
    pub dependency_dir: Option<PathBuf>,
    pub prune_command: Option<Vec<String>>,
    pub install_command: Option<Vec<String>>,
    pub build_command: Option<Vec<String>>,
    pub commit_tag: Option<String>,
}

impl ConfigFile {
    /// Load overrides from `path`.
    ///
    /// Returns `ConfigError::NotFound` if absent,
    /// `ConfigError::Parse` (with path + line context) if malformed YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
