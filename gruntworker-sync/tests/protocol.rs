//! End-to-end protocol tests driving `Worker` with a scripted runner.

mod common;

use std::fs;

use common::*;
use gruntworker_sync::testing::ScriptedRunner;
use gruntworker_sync::{RunOutcome, Stage, SyncError, Worker};

/// Checkpoint, fetch, branch sync, post-fetch HEAD.
fn sync_prefix() -> Vec<String> {
    let mut calls = vec![REV_PARSE.to_owned(), FETCH.to_owned()];
    calls.extend(reset_to("FETCH_HEAD"));
    calls.push(REV_PARSE.to_owned());
    calls
}

// ---------------------------------------------------------------------------
// 1. Nothing new on the remote
// ---------------------------------------------------------------------------

#[test]
fn unchanged_head_skips_install_build_commit_and_push() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, CHECKPOINT);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("run");

    assert_eq!(
        report.outcome,
        RunOutcome::Unchanged {
            head: report.checkpoint.clone()
        }
    );
    assert!(report.outcome.is_success());
    assert_eq!(runner.calls(), sync_prefix());
    assert_eq!(runner.count_prefix("npm"), 0);
    assert_eq!(runner.count(BUILD), 0);
}

#[test]
fn repeated_runs_without_new_commits_are_noops() {
    let repo = checkout_with_manifest();
    for _ in 0..2 {
        let runner = heads(CHECKPOINT, CHECKPOINT);
        let worker = Worker::with_runner(config(repo.path()), &runner);
        let report = worker.run().expect("run");
        assert!(matches!(report.outcome, RunOutcome::Unchanged { .. }));
        assert_eq!(runner.count(BUILD), 0);
        assert_eq!(runner.count_prefix("git commit"), 0);
    }
}

// ---------------------------------------------------------------------------
// 2. New commits, successful build
// ---------------------------------------------------------------------------

#[test]
fn modified_output_is_committed_and_pushed_once() {
    let repo = checkout_with_manifest();
    let runner = heads_with_commit(CHECKPOINT, FETCHED).stdout(STATUS, b" M dist/app.js\0");
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("run");

    match &report.outcome {
        RunOutcome::Pushed {
            previous,
            head,
            files,
        } => {
            assert_eq!(previous.as_str(), FETCHED);
            assert_eq!(head.as_str(), COMMITTED);
            assert_eq!(files, &["dist/app.js"]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let mut expected = sync_prefix();
    expected.extend(
        [
            "npm prune",
            "npm install",
            BUILD,
            STATUS,
            "git add -- dist/app.js",
            COMMIT,
            REV_PARSE,
            PUSH,
        ]
        .map(String::from),
    );
    assert_eq!(runner.calls(), expected);
    assert!(COMMIT.contains("automatic `grunt dist`"));
    assert!(COMMIT.contains("[ci skip]"));
    assert!(
        !repo.path().join("npm-shrinkwrap.json").exists(),
        "staged manifest must be removed"
    );
}

#[test]
fn build_without_modifications_does_not_commit() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, FETCHED).stdout(STATUS, b"");
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("run");

    assert!(matches!(report.outcome, RunOutcome::NothingToCommit { .. }));
    assert!(report.outcome.is_success());
    assert_eq!(runner.count(BUILD), 1);
    assert_eq!(runner.count_prefix("git add"), 0);
    assert_eq!(runner.count_prefix("git commit"), 0);
    assert_eq!(runner.count(PUSH), 0);
}

#[test]
fn only_worktree_modified_paths_are_added() {
    let repo = checkout_with_manifest();
    let runner = heads_with_commit(CHECKPOINT, FETCHED)
        .stdout(STATUS, b" M dist/b.js\0A  staged.js\0 M dist/a.js\0");
    let worker = Worker::with_runner(config(repo.path()), &runner);

    worker.run().expect("run");

    assert_eq!(runner.count("git add -- dist/b.js dist/a.js"), 1);
}

// ---------------------------------------------------------------------------
// 3. Fatal errors
// ---------------------------------------------------------------------------

#[test]
fn malformed_checkpoint_stops_before_any_mutation() {
    let repo = checkout_with_manifest();
    let runner = ScriptedRunner::default().stdout(REV_PARSE, b"deadbeef\n");
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let err = worker.run().unwrap_err();

    assert!(matches!(err, SyncError::MalformedCommit(_)), "got: {err}");
    assert_eq!(runner.calls(), [REV_PARSE]);
}

#[test]
fn malformed_post_fetch_head_stops_before_build() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, &FETCHED[..39]);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let err = worker.run().unwrap_err();

    assert!(matches!(err, SyncError::MalformedCommit(_)), "got: {err}");
    assert_eq!(runner.calls(), sync_prefix());
}

#[test]
fn fetch_failure_is_fatal_and_touches_nothing() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, FETCHED).fail(FETCH);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let err = worker.run().unwrap_err();

    assert!(matches!(err, SyncError::Fetch { .. }), "got: {err}");
    assert_eq!(runner.calls(), [REV_PARSE, FETCH]);
}

#[test]
fn failed_sync_to_fetched_restores_branch_checkout() {
    let repo = checkout_with_manifest();
    let runner =
        heads(CHECKPOINT, FETCHED).fail("git branch -f master FETCH_HEAD");
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let err = worker.run().unwrap_err();

    match &err {
        SyncError::BranchUpdate { target, .. } => assert_eq!(target, "FETCH_HEAD"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        runner.calls(),
        [
            REV_PARSE,
            FETCH,
            "git checkout -q -f FETCH_HEAD",
            "git branch -f master FETCH_HEAD",
            "git checkout -q -f master",
        ]
    );
}

#[test]
fn missing_manifest_is_fatal_without_rollback() {
    let repo = tempfile::TempDir::new().expect("tempdir");
    let runner = heads(CHECKPOINT, FETCHED);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let err = worker.run().unwrap_err();

    assert!(matches!(err, SyncError::ManifestMissing { .. }), "got: {err}");
    assert_eq!(runner.calls(), sync_prefix());
}

// ---------------------------------------------------------------------------
// 4. Rollback
// ---------------------------------------------------------------------------

#[test]
fn build_failure_rolls_back_to_post_fetch_commit() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, FETCHED).fail(BUILD);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("rollback is not fatal");

    match &report.outcome {
        RunOutcome::RolledBack { head, stage, .. } => {
            assert_eq!(head.as_str(), FETCHED);
            assert_eq!(*stage, Stage::Build);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!report.outcome.is_success());

    let calls = runner.calls();
    assert_eq!(calls[calls.len() - 3..], reset_to(FETCHED)[..]);
    assert_eq!(runner.count_prefix(&format!("git checkout -q -f {CHECKPOINT}")), 0);
    assert_eq!(runner.count_prefix("git commit"), 0);
    assert_eq!(runner.count(PUSH), 0);
}

#[test]
fn push_failure_rolls_back_without_retry() {
    let repo = checkout_with_manifest();
    let runner = heads_with_commit(CHECKPOINT, FETCHED)
        .stdout(STATUS, b" M dist/app.js\0")
        .fail(PUSH);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("rollback is not fatal");

    assert!(matches!(
        report.outcome,
        RunOutcome::RolledBack {
            stage: Stage::Push,
            ..
        }
    ));
    assert_eq!(runner.count(PUSH), 1);
    assert_eq!(runner.count(COMMIT), 1);
    let calls = runner.calls();
    assert_eq!(calls[calls.len() - 3..], reset_to(FETCHED)[..]);
}

#[test]
fn commit_failure_rolls_back() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, FETCHED)
        .stdout(STATUS, b" M dist/app.js\0")
        .fail(COMMIT);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("rollback is not fatal");

    assert!(matches!(
        report.outcome,
        RunOutcome::RolledBack {
            stage: Stage::Commit,
            ..
        }
    ));
    assert_eq!(runner.count(PUSH), 0);
}

#[test]
fn status_failure_rolls_back() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, FETCHED).fail(STATUS);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("rollback is not fatal");

    assert!(matches!(
        report.outcome,
        RunOutcome::RolledBack {
            stage: Stage::Status,
            ..
        }
    ));
    assert_eq!(runner.count_prefix("git add"), 0);
    let calls = runner.calls();
    assert_eq!(calls[calls.len() - 3..], reset_to(FETCHED)[..]);
}

#[test]
fn add_failure_rolls_back_before_committing() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, FETCHED)
        .stdout(STATUS, b" M dist/app.js\0")
        .fail("git add -- dist/app.js");
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("rollback is not fatal");

    assert!(matches!(
        report.outcome,
        RunOutcome::RolledBack {
            stage: Stage::Commit,
            ..
        }
    ));
    assert_eq!(runner.count(COMMIT), 0);
    assert_eq!(runner.count(PUSH), 0);
    let calls = runner.calls();
    assert_eq!(calls[calls.len() - 3..], reset_to(FETCHED)[..]);
}

#[test]
fn unreadable_head_after_commit_rolls_back_without_pushing() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, FETCHED)
        .stdout(STATUS, b" M dist/app.js\0")
        .fail(REV_PARSE);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("rollback is not fatal");

    assert!(matches!(
        report.outcome,
        RunOutcome::RolledBack {
            stage: Stage::Commit,
            ..
        }
    ));
    assert_eq!(runner.count(COMMIT), 1);
    assert_eq!(runner.count(PUSH), 0);
}

#[test]
fn dependency_failure_purges_and_rolls_back() {
    let repo = checkout_with_manifest();
    fs::create_dir_all(repo.path().join("node_modules/grunt")).expect("mkdir");
    let runner = heads(CHECKPOINT, FETCHED).fail("npm install");
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("rollback is not fatal");

    assert!(matches!(
        report.outcome,
        RunOutcome::RolledBack {
            stage: Stage::Dependencies,
            ..
        }
    ));
    assert_eq!(runner.count(BUILD), 0);
    assert!(!repo.path().join("node_modules").exists());
    assert!(!repo.path().join("npm-shrinkwrap.json").exists());
}

#[test]
fn failed_rollback_is_fatal_and_keeps_the_cause() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, FETCHED)
        .fail(BUILD)
        .fail(&format!("git branch -f master {FETCHED}"));
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let err = worker.run().unwrap_err();

    match &err {
        SyncError::Rollback { target, cause, .. } => {
            assert_eq!(target, FETCHED);
            assert_eq!(cause.stage(), Some(Stage::Build));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        runner.calls().last().map(String::as_str),
        Some("git checkout -q -f master")
    );
}

// ---------------------------------------------------------------------------
// 5. Report
// ---------------------------------------------------------------------------

#[test]
fn report_serializes_with_status_tag() {
    let repo = checkout_with_manifest();
    let runner = heads(CHECKPOINT, FETCHED).fail(BUILD);
    let worker = Worker::with_runner(config(repo.path()), &runner);

    let report = worker.run().expect("run");
    let json = serde_json::to_value(&report).expect("serialize");

    assert_eq!(json["branch"], "master");
    assert_eq!(json["checkpoint"], CHECKPOINT);
    assert_eq!(json["outcome"]["status"], "rolled_back");
    assert_eq!(json["outcome"]["stage"], "build");
    assert_eq!(json["outcome"]["head"], FETCHED);
}
