//! Sandbox templates and how code is run in each of them.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the go strategy stores the program before running it.
pub const GO_SOURCE_PATH: &str = "/workspace/main.go";

/// Environment a sandbox is created from, and the language used to run code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    /// Python 3 interpreter.
    Python,
    /// Node.js runtime.
    Node,
    /// Go toolchain.
    Go,
}

impl Template {
    /// All known templates.
    pub const ALL: [Template; 3] = [Template::Python, Template::Node, Template::Go];

    /// Wire name of the template.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Node => "node",
            Self::Go => "go",
        }
    }

    /// How to run `code` in a sandbox of this kind.
    pub fn run_plan(&self, code: &str) -> RunPlan {
        match self {
            Self::Python => RunPlan::command(["python3", "-c", code]),
            Self::Node => RunPlan::command(["node", "-e", code]),
            Self::Go => RunPlan {
                source: Some(SourceFile {
                    path: GO_SOURCE_PATH,
                    content: code.to_string(),
                }),
                cmd: vec!["go".into(), "run".into(), GO_SOURCE_PATH.into()],
            },
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownLanguage(s.to_string()))
    }
}

/// A file the run strategy writes before executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Destination inside the sandbox.
    pub path: &'static str,
    /// File content.
    pub content: String,
}

/// Steps needed to run a piece of code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// File to write first, if any.
    pub source: Option<SourceFile>,
    /// Command to execute.
    pub cmd: Vec<String>,
}

impl RunPlan {
    fn command<const N: usize>(cmd: [&str; N]) -> Self {
        Self {
            source: None,
            cmd: cmd.into_iter().map(String::from).collect(),
        }
    }
}
