//! Command-line arguments.

use capsule_sdk::{Template, TextEncoding, DEFAULT_WORKSPACE};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Drive Capsule sandboxes from the command line.
#[derive(Debug, Parser)]
#[command(name = "capsule", version, about)]
pub struct Cli {
    /// Base URL of the capsule server.
    #[arg(
        long,
        env = "CAPSULE_URL",
        default_value = "http://localhost:8080",
        global = true
    )]
    pub url: String,

    /// Round-trip timeout in seconds.
    #[arg(long, env = "CAPSULE_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a sandbox and print its details as JSON.
    Create {
        /// Template (python, node, go).
        template: Template,
        /// Time-to-live in milliseconds.
        #[arg(long, default_value_t = 600_000)]
        ttl_ms: u64,
    },

    /// Execute a command in a sandbox.
    Exec {
        /// Sandbox ID.
        id: String,
        /// Working directory.
        #[arg(long)]
        cwd: Option<String>,
        /// Environment variable as KEY=VALUE (repeatable).
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
        /// Server-side execution limit in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Maximum stdout bytes to capture.
        #[arg(long)]
        max_stdout_bytes: Option<u64>,
        /// Maximum stderr bytes to capture.
        #[arg(long)]
        max_stderr_bytes: Option<u64>,
        /// Print the full result as JSON instead of the raw streams.
        #[arg(long)]
        json: bool,
        /// Command and arguments.
        #[arg(last = true, required = true)]
        cmd: Vec<String>,
    },

    /// Run code in a throwaway sandbox that is deleted afterwards.
    Run {
        /// Template (python, node, go).
        template: Template,
        /// Source code to run.
        code: String,
        /// Print the full result as JSON instead of the raw streams.
        #[arg(long)]
        json: bool,
    },

    /// Delete a sandbox.
    Delete {
        /// Sandbox ID.
        id: String,
    },

    /// Upload a local file into a sandbox.
    Write {
        /// Sandbox ID.
        id: String,
        /// Destination path inside the sandbox.
        path: String,
        /// Local file to upload.
        local: PathBuf,
    },

    /// Print a file from a sandbox.
    Read {
        /// Sandbox ID.
        id: String,
        /// Path inside the sandbox.
        path: String,
        /// Decode as text with this encoding instead of copying raw bytes.
        #[arg(long)]
        encoding: Option<TextEncoding>,
    },

    /// List a directory as JSON.
    Ls {
        /// Sandbox ID.
        id: String,
        /// Directory path.
        #[arg(default_value = DEFAULT_WORKSPACE)]
        path: String,
    },

    /// Print the WebSocket terminal URL of a sandbox.
    TerminalUrl {
        /// Sandbox ID.
        id: String,
    },

    /// Check that the server is reachable.
    Health,
}

/// Parse `KEY=VALUE`.
pub fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}
