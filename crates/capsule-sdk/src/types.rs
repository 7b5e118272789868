//! Values returned by and passed to capsule operations.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Result of executing a command in a sandbox.
///
/// Every field must be present in the server payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Process exit code.
    pub exit_code: i32,
    /// True if the server stopped the command at its time limit.
    pub timed_out: bool,
    /// True if stdout was cut at the capture limit.
    pub stdout_truncated: bool,
    /// True if stderr was cut at the capture limit.
    pub stderr_truncated: bool,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ExecResult {
    /// Check if the command succeeded (exit code 0, not timed out).
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// File entry from a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// File or directory name.
    pub name: String,
    /// Absolute path inside the sandbox.
    pub path: String,
    /// True if this is a directory.
    pub is_dir: bool,
    /// File size in bytes.
    pub size: u64,
}

/// Optional settings for `exec`.
///
/// Each field is sent only when set. A set value is always sent, even an
/// empty environment or a zero limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Working directory for the command.
    pub cwd: Option<String>,
    /// Environment variables added to the sandbox environment.
    pub env: Option<HashMap<String, String>>,
    /// Server-side execution limit in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Maximum stdout bytes to capture.
    pub max_stdout_bytes: Option<u64>,
    /// Maximum stderr bytes to capture.
    pub max_stderr_bytes: Option<u64>,
}

impl ExecOptions {
    /// Options with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Replace the environment map.
    pub fn env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Add one environment variable.
    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the server-side execution limit.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Set the stdout capture limit.
    pub fn max_stdout_bytes(mut self, bytes: u64) -> Self {
        self.max_stdout_bytes = Some(bytes);
        self
    }

    /// Set the stderr capture limit.
    pub fn max_stderr_bytes(mut self, bytes: u64) -> Self {
        self.max_stderr_bytes = Some(bytes);
        self
    }
}

/// Text encoding used by `read_file_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Strict UTF-8.
    #[default]
    Utf8,
    /// UTF-8 with invalid sequences replaced by U+FFFD.
    Utf8Lossy,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
    /// 7-bit ASCII.
    Ascii,
}

impl TextEncoding {
    /// Canonical label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Lossy => "utf-8-lossy",
            Self::Latin1 => "latin-1",
            Self::Ascii => "ascii",
        }
    }

    /// Decode bytes into a string.
    pub fn decode(&self, bytes: Vec<u8>) -> Result<String, Error> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(|e| self.decode_error(e)),
            Self::Utf8Lossy => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(self.decode_error(format!(
                    "byte 0x{:02x} at offset {pos} is not ASCII",
                    bytes[pos]
                ))),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
        }
    }

    fn decode_error(&self, reason: impl fmt::Display) -> Error {
        Error::Decode {
            encoding: self.as_str(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-8-lossy" | "utf8-lossy" | "lossy" => Ok(Self::Utf8Lossy),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Self::Latin1),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            other => Err(format!("unsupported encoding: {other}")),
        }
    }
}
