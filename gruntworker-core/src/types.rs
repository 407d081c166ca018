//! Domain types shared by the sync protocol and the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MalformedCommit};

/// The ref `git fetch` writes the fetched tip to. Never a local branch.
pub const FETCH_HEAD: &str = "FETCH_HEAD";

// ---------------------------------------------------------------------------
// CommitSha
// ---------------------------------------------------------------------------

/// A full 40-hex-digit commit identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CommitSha(String);

impl CommitSha {
    pub const LEN: usize = 40;

    /// Validate raw VCS output (surrounding whitespace is ignored).
    pub fn parse(raw: &[u8]) -> Result<Self, MalformedCommit> {
        let trimmed = raw.trim_ascii();
        if trimmed.len() != Self::LEN || !trimmed.iter().all(u8::is_ascii_hexdigit) {
            return Err(MalformedCommit {
                raw: String::from_utf8_lossy(trimmed).into_owned(),
            });
        }
        // All bytes are ASCII hex digits, so this cannot lose data.
        Ok(Self(String::from_utf8_lossy(trimmed).to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

impl fmt::Display for CommitSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for CommitSha {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// BranchName
// ---------------------------------------------------------------------------

/// Name of the authoritative integration branch. Fixed for one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidBranch { name });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(b: BranchName) -> Self {
        b.0
    }
}

impl std::str::FromStr for BranchName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
