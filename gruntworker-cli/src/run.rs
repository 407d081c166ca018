//! The single `gruntworker <BRANCH>` command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use gruntworker_core::{BranchName, ConfigFile, WorkerConfig};
use gruntworker_sync::{RunReport, Worker};

/// Arguments for a worker run.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Primary branch to sync, rebuild and push.
    pub branch: BranchName,

    /// Root of the git checkout (defaults to the current directory).
    #[arg(long, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Remote to fetch from and push to.
    #[arg(long, value_name = "NAME")]
    pub remote: Option<String>,

    /// YAML file overriding manifest locations, commands and commit tag.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<ExitCode> {
        let json = self.json;
        let config = self.into_config()?;
        tracing::info!(
            "Starting run for {} in {}",
            config.primary_branch,
            config.repo_root.display()
        );

        let report = Worker::new(config).run().context("sync run aborted")?;
        tracing::debug!(
            "{} left at {} after {} ms",
            report.branch,
            report.outcome.head().short(),
            report.duration_ms
        );
        if json {
            print_report(&report)?;
        }

        Ok(if report.outcome.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    fn into_config(self) -> Result<WorkerConfig> {
        let repo_root = match self.repo {
            Some(path) => path,
            None => std::env::current_dir().context("could not determine current directory")?,
        };

        let mut config = WorkerConfig::new(repo_root, self.branch);
        if let Some(path) = &self.config {
            let file = ConfigFile::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            config.apply(file)?;
        }
        if let Some(remote) = self.remote {
            config.remote = remote;
        }
        Ok(config)
    }
}

fn print_report(report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize run report")?;
    println!("{json}");
    Ok(())
}
