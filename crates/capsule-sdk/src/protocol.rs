//! Parameter and result shapes of the `sandbox.v1` methods.

use crate::error::{CapsuleError, Result};
use crate::template::Template;
use crate::types::{ExecOptions, FileInfo};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Method names.
pub mod methods {
    pub const CREATE: &str = "sandbox.v1.create";
    pub const EXEC: &str = "sandbox.v1.exec";
    pub const DELETE: &str = "sandbox.v1.delete";
    pub const WRITE_FILE: &str = "sandbox.v1.writeFile";
    pub const READ_FILE: &str = "sandbox.v1.readFile";
    pub const LIST_DIR: &str = "sandbox.v1.listDir";
}

/// Parameters for `sandbox.v1.create`.
#[derive(Debug, Serialize)]
pub struct CreateParams {
    pub template: Template,
    pub ttl_ms: u64,
}

/// Result of `sandbox.v1.create`.
#[derive(Debug, Deserialize)]
pub struct CreateResult {
    pub id: String,
    pub template: String,
    pub created_at: String,
    pub expires_at: String,
}

/// Parameters for `sandbox.v1.exec`.
#[derive(Debug, Serialize)]
pub struct ExecParams<'a> {
    pub id: &'a str,
    pub cmd: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<&'a HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stdout_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stderr_bytes: Option<u64>,
}

impl<'a> ExecParams<'a> {
    pub fn new(id: &'a str, cmd: &'a [String], options: &'a ExecOptions) -> Self {
        Self {
            id,
            cmd,
            cwd: options.cwd.as_deref(),
            env: options.env.as_ref(),
            timeout_ms: options.timeout_ms,
            max_stdout_bytes: options.max_stdout_bytes,
            max_stderr_bytes: options.max_stderr_bytes,
        }
    }
}

/// Parameters for `sandbox.v1.delete`.
#[derive(Debug, Serialize)]
pub struct SandboxRef<'a> {
    pub id: &'a str,
}

/// Parameters for `sandbox.v1.writeFile`.
#[derive(Debug, Serialize)]
pub struct WriteFileParams<'a> {
    pub id: &'a str,
    pub path: &'a str,
    /// Base64-encoded file content.
    pub content: String,
}

/// Parameters for `sandbox.v1.readFile` and `sandbox.v1.listDir`.
#[derive(Debug, Serialize)]
pub struct PathParams<'a> {
    pub id: &'a str,
    pub path: &'a str,
}

/// Result of `sandbox.v1.readFile`.
#[derive(Debug, Deserialize)]
pub struct ReadFileResult {
    /// Base64-encoded file content.
    pub content: String,
}

/// Result of `sandbox.v1.listDir`.
#[derive(Debug, Default, Deserialize)]
pub struct ListDirResult {
    #[serde(default)]
    pub files: Option<Vec<FileInfo>>,
}

/// Parse a server timestamp.
///
/// RFC 3339 is expected (`Z` is the same as `+00:00`). Timestamps without an
/// offset are taken as UTC.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| CapsuleError::invalid_response(format!("{field} {value:?}: {e}")))
}
