//! Command Runner: the only place child processes are spawned.
//!
//! Arguments and captured output are opaque bytes. They are decoded only for
//! log lines and error messages, lossily, so a stray non-UTF-8 path from
//! `git status` can never abort a run.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::CommandError;

// ---------------------------------------------------------------------------
// Cmd
// ---------------------------------------------------------------------------

/// An argument vector; element 0 is the program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cmd {
    argv: Vec<Vec<u8>>,
}

impl Cmd {
    pub fn new(program: impl AsRef<[u8]>) -> Self {
        Self {
            argv: vec![program.as_ref().to_vec()],
        }
    }

    /// Build from a configured command line such as `["npm", "install"]`.
    pub fn from_argv<S: AsRef<[u8]>>(argv: &[S]) -> Self {
        Self {
            argv: argv.iter().map(|a| a.as_ref().to_vec()).collect(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.argv.push(arg.as_ref().to_vec());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.argv
            .extend(args.into_iter().map(|a| a.as_ref().to_vec()));
        self
    }

    pub fn argv(&self) -> &[Vec<u8>] {
        &self.argv
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.argv.join(&b' ');
        f.write_str(&String::from_utf8_lossy(&joined))
    }
}

// ---------------------------------------------------------------------------
// CommandRunner
// ---------------------------------------------------------------------------

/// Executes commands to completion with no stdin.
pub trait CommandRunner {
    /// Run for success/failure only; output is not returned.
    fn run(&self, cmd: &Cmd) -> Result<(), CommandError>;

    /// Run and return captured stdout.
    fn output(&self, cmd: &Cmd) -> Result<Vec<u8>, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, cmd: &Cmd) -> Result<(), CommandError> {
        (**self).run(cmd)
    }

    fn output(&self, cmd: &Cmd) -> Result<Vec<u8>, CommandError> {
        (**self).output(cmd)
    }
}

/// Spawns real child processes rooted at a repository checkout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    root: PathBuf,
}

impl ProcessRunner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn command(&self, cmd: &Cmd) -> Result<Command, CommandError> {
        let (program, args) = cmd.argv().split_first().ok_or(CommandError::Empty)?;
        tracing::info!("\trunning: {cmd}");
        let mut command = Command::new(os_arg(program));
        command
            .args(args.iter().map(|a| os_arg(a)))
            .current_dir(&self.root)
            .stdin(Stdio::null());
        Ok(command)
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, cmd: &Cmd) -> Result<(), CommandError> {
        // Child stdout joins the log stream; the worker's stdout carries only the report.
        let status = self
            .command(cmd)?
            .stdout(Stdio::from(std::io::stderr()))
            .status()
            .map_err(|source| spawn_err(cmd, source))?;
        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                command: cmd.to_string(),
                code: status.code(),
            })
        }
    }

    fn output(&self, cmd: &Cmd) -> Result<Vec<u8>, CommandError> {
        let output = self
            .command(cmd)?
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| spawn_err(cmd, source))?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(CommandError::Failed {
                command: cmd.to_string(),
                code: output.status.code(),
            })
        }
    }
}

fn spawn_err(cmd: &Cmd, source: std::io::Error) -> CommandError {
    CommandError::Spawn {
        command: cmd.to_string(),
        source,
    }
}

#[cfg(unix)]
fn os_arg(bytes: &[u8]) -> OsString {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(bytes).to_os_string()
}

#[cfg(not(unix))]
fn os_arg(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}
