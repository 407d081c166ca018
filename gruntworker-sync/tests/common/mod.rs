//! Shared fixtures for protocol tests: scripted HEADs and a scratch checkout.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use gruntworker_core::{BranchName, WorkerConfig};
use gruntworker_sync::testing::ScriptedRunner;
use tempfile::TempDir;

pub const CHECKPOINT: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const FETCHED: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const COMMITTED: &str = "cccccccccccccccccccccccccccccccccccccccc";

pub const REV_PARSE: &str = "git rev-parse HEAD";
pub const FETCH: &str = "git fetch origin +master";
pub const BUILD: &str = "grunt dist clean:docs copy:docs";
pub const STATUS: &str = "git status -z -uno --ignore-submodules=all";
pub const PUSH: &str = "git push origin master";
pub const COMMIT: &str = "git commit -m automatic `grunt dist`\n\n[ci skip]";

/// HEAD resolves to `before`, then to `after` once the branch is synced.
pub fn heads(before: &str, after: &str) -> ScriptedRunner {
    ScriptedRunner::default()
        .stdout(REV_PARSE, format!("{before}\n").as_bytes())
        .stdout(REV_PARSE, format!("{after}\n").as_bytes())
}

/// Like [`heads`], with HEAD at [`COMMITTED`] after the automation commit.
pub fn heads_with_commit(before: &str, after: &str) -> ScriptedRunner {
    heads(before, after).stdout(REV_PARSE, format!("{COMMITTED}\n").as_bytes())
}

/// Scratch checkout directory with a manifest staged under `grunt/`.
pub fn checkout_with_manifest() -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    fs::create_dir_all(tmp.path().join("grunt")).expect("mkdir grunt");
    fs::write(tmp.path().join("grunt/npm-shrinkwrap.json"), "{}").expect("write manifest");
    tmp
}

pub fn config(root: &Path) -> WorkerConfig {
    WorkerConfig::new(root, BranchName::new("master").expect("branch"))
}

/// The three commands that move `master` and the checkout to `target`.
pub fn reset_to(target: &str) -> Vec<String> {
    vec![
        format!("git checkout -q -f {target}"),
        format!("git branch -f master {target}"),
        "git checkout -q -f master".to_owned(),
    ]
}
