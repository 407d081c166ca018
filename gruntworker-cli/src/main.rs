//! Gruntworker — keep a branch's built artifacts in sync with its sources.
//!
//! # Usage
//!
//! ```text
//! gruntworker <BRANCH> [--repo <path>] [--remote <name>] [--config <file>] [--json]
//! ```
//!
//! Exit status: `0` when the run ends in a success state, `1` on any fatal
//! error or after a rollback, `2` on a usage error.

mod logging;
mod run;

use std::process::ExitCode;

use clap::Parser;

use run::RunArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "gruntworker",
    version,
    about = "Fetch a branch, rebuild its distributable files, and push the result",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    match cli.run.run() {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            tracing::error!("Failed!");
            ExitCode::FAILURE
        }
    }
}
