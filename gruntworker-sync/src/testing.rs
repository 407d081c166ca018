//! Scripted in-memory runner for driving the protocol without processes.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::CommandError;
use crate::runner::{Cmd, CommandRunner};

type Reply = Result<Vec<u8>, Option<i32>>;

/// Records every command as its display string and replies from a script.
///
/// Commands without a scripted reply succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<String>>,
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
}

impl ScriptedRunner {
    /// Queue `out` as the next stdout of `cmd`.
    pub fn stdout(self, cmd: &str, out: &[u8]) -> Self {
        self.push(cmd, Ok(out.to_vec()))
    }

    /// Make the next invocation of `cmd` exit with status 1.
    pub fn fail(self, cmd: &str) -> Self {
        self.push(cmd, Err(Some(1)))
    }

    fn push(self, cmd: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .entry(cmd.to_owned())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn count(&self, cmd: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == cmd).count()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn reply(&self, cmd: &Cmd) -> Result<Vec<u8>, CommandError> {
        let command = cmd.to_string();
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(command.clone());
        let reply = self
            .replies
            .lock()
            .expect("replies lock poisoned")
            .get_mut(&command)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(Vec::new()));
        reply.map_err(|code| CommandError::Failed { command, code })
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &Cmd) -> Result<(), CommandError> {
        self.reply(cmd).map(drop)
    }

    fn output(&self, cmd: &Cmd) -> Result<Vec<u8>, CommandError> {
        self.reply(cmd)
    }
}
