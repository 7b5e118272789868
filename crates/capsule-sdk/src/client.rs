//! Typed facade over the JSON-RPC client.
//!
//! One method per `sandbox.v1` action. Every method that takes a sandbox id
//! issues exactly one RPC call; none retries, caches or locks.

use crate::capsule::Capsule;
use crate::config::ClientConfig;
use crate::error::{CapsuleError, ConfigError, Error, Result};
use crate::protocol::{
    methods, parse_timestamp, CreateParams, CreateResult, ExecParams, ListDirResult, PathParams,
    ReadFileResult, SandboxRef, WriteFileParams,
};
use crate::rpc::RpcClient;
use crate::template::Template;
use crate::transport::{HttpTransport, Transport};
use crate::types::{ExecOptions, ExecResult, FileInfo, TextEncoding};
use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default sandbox time-to-live (10 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_millis(600_000);

/// Directory listed when no path is given.
pub const DEFAULT_WORKSPACE: &str = "/workspace";

/// Client for creating and driving capsules.
///
/// ```ignore
/// use capsule_sdk::{CapsuleClient, Template};
///
/// # async fn example() -> Result<(), capsule_sdk::Error> {
/// let client = CapsuleClient::new("http://localhost:8080")?;
/// let capsule = client.create(Template::Python).await?;
/// let result = capsule.run("print('Hello, World!')").await?;
/// println!("{}", result.stdout);
/// capsule.delete().await?;
/// # Ok(())
/// # }
/// ```
pub struct CapsuleClient {
    config: ClientConfig,
    rpc: Arc<RpcClient>,
}

impl CapsuleClient {
    /// Connect to a server with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_config(ClientConfig::new(base_url))
    }

    /// Connect using an explicit configuration over HTTP.
    pub fn with_config(config: ClientConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Use a custom transport. The config still provides the terminal URL.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        tracing::debug!(base_url = %config.base_url, timeout_ms = config.timeout.as_millis() as u64, "Creating capsule client");
        Self {
            config,
            rpc: Arc::new(RpcClient::new(transport)),
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying JSON-RPC client.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Shared handle on the RPC client, for work that outlives a borrow.
    pub(crate) fn shared_rpc(&self) -> Arc<RpcClient> {
        Arc::clone(&self.rpc)
    }

    /// Issue a raw JSON-RPC call.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.rpc.call(method, params).await
    }

    /// Check that the server answers on its health endpoint.
    pub async fn health(&self) -> Result<()> {
        self.rpc.transport().health().await.map_err(|e| {
            tracing::warn!(base_url = %self.config.base_url, error = %e, "Health check failed");
            CapsuleError::from(e)
        })
    }

    /// Create a sandbox with the default TTL.
    pub async fn create(&self, template: Template) -> Result<Capsule<'_>> {
        self.create_with_ttl(template, DEFAULT_TTL).await
    }

    /// Create a sandbox that the server expires after `ttl`.
    pub async fn create_with_ttl(&self, template: Template, ttl: Duration) -> Result<Capsule<'_>> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(template = %template, ttl_ms, "Creating capsule");

        let result: CreateResult = self
            .rpc
            .call_typed(methods::CREATE, &CreateParams { template, ttl_ms })
            .await?;

        let created_at = parse_timestamp("created_at", &result.created_at)?;
        let expires_at = parse_timestamp("expires_at", &result.expires_at)?;
        tracing::info!(sandbox_id = %result.id, template = %result.template, %expires_at, "Capsule created");

        Ok(Capsule::new(
            self,
            result.id,
            result.template,
            created_at,
            expires_at,
        ))
    }

    /// Create a sandbox, hand it to `f`, and delete it when `f` finishes.
    ///
    /// See [`Capsule::scoped`] for the cleanup contract.
    pub async fn with_capsule<'c, F, Fut, T, E>(&'c self, template: Template, f: F) -> Result<T, E>
    where
        F: FnOnce(Capsule<'c>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CapsuleError>,
    {
        let capsule = self.create(template).await?;
        capsule.scoped(f).await
    }

    /// Execute a command in a sandbox.
    ///
    /// `options.timeout_ms` bounds execution on the server only; the client
    /// waits at most its own round-trip timeout.
    pub async fn exec<I, S>(
        &self,
        sandbox_id: &str,
        cmd: I,
        options: &ExecOptions,
    ) -> Result<ExecResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cmd: Vec<String> = cmd.into_iter().map(Into::into).collect();
        tracing::debug!(sandbox_id = %sandbox_id, argv0 = cmd.first().map(String::as_str).unwrap_or(""), args = cmd.len(), "Executing command");

        let result: ExecResult = self
            .rpc
            .call_typed(methods::EXEC, &ExecParams::new(sandbox_id, &cmd, options))
            .await?;

        tracing::debug!(
            sandbox_id = %sandbox_id,
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            duration_ms = result.duration_ms,
            "Command completed"
        );
        Ok(result)
    }

    /// Delete a sandbox. The server decides whether this succeeds.
    pub async fn delete(&self, sandbox_id: &str) -> Result<()> {
        delete_sandbox(&self.rpc, sandbox_id).await
    }

    /// Write a file. Text is sent as its UTF-8 bytes; all content is base64
    /// encoded on the wire.
    pub async fn write_file(
        &self,
        sandbox_id: &str,
        path: &str,
        content: impl AsRef<[u8]>,
    ) -> Result<()> {
        let content = content.as_ref();
        tracing::debug!(sandbox_id = %sandbox_id, path = %path, content_len = content.len(), "Writing file");
        let params = WriteFileParams {
            id: sandbox_id,
            path,
            content: general_purpose::STANDARD.encode(content),
        };
        self.rpc
            .call(methods::WRITE_FILE, Some(to_params(&params)?))
            .await?;
        Ok(())
    }

    /// Read a file as raw bytes.
    pub async fn read_file(&self, sandbox_id: &str, path: &str) -> Result<Vec<u8>> {
        tracing::debug!(sandbox_id = %sandbox_id, path = %path, "Reading file");
        let result: ReadFileResult = self
            .rpc
            .call_typed(methods::READ_FILE, &PathParams { id: sandbox_id, path })
            .await?;

        let bytes = general_purpose::STANDARD
            .decode(result.content.as_bytes())
            .map_err(|e| CapsuleError::invalid_response(format!("file content: {e}")))?;
        tracing::trace!(sandbox_id = %sandbox_id, size = bytes.len(), "File read");
        Ok(bytes)
    }

    /// Read a file and decode it as text.
    pub async fn read_file_text(
        &self,
        sandbox_id: &str,
        path: &str,
        encoding: TextEncoding,
    ) -> Result<String, Error> {
        let bytes = self.read_file(sandbox_id, path).await?;
        encoding.decode(bytes)
    }

    /// List a directory. A missing or empty `files` field yields no entries.
    pub async fn list_dir(&self, sandbox_id: &str, path: &str) -> Result<Vec<FileInfo>> {
        tracing::debug!(sandbox_id = %sandbox_id, path = %path, "Listing directory");
        let result: Option<ListDirResult> = self
            .rpc
            .call_typed(methods::LIST_DIR, &PathParams { id: sandbox_id, path })
            .await?;

        let files = result.and_then(|r| r.files).unwrap_or_default();
        tracing::trace!(sandbox_id = %sandbox_id, count = files.len(), "Directory listed");
        Ok(files)
    }

    /// WebSocket URL of the sandbox terminal. No request is made.
    pub fn terminal_url(&self, sandbox_id: &str) -> String {
        self.config.terminal_url(sandbox_id)
    }
}

impl fmt::Debug for CapsuleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapsuleClient")
            .field("config", &self.config)
            .field("requests_sent", &self.rpc.requests_sent())
            .finish()
    }
}

/// Issue `sandbox.v1.delete` for `sandbox_id`.
pub(crate) async fn delete_sandbox(rpc: &RpcClient, sandbox_id: &str) -> Result<()> {
    tracing::debug!(sandbox_id = %sandbox_id, "Deleting capsule");
    rpc.call(
        methods::DELETE,
        Some(to_params(&SandboxRef { id: sandbox_id })?),
    )
    .await?;
    tracing::info!(sandbox_id = %sandbox_id, "Capsule deleted");
    Ok(())
}

fn to_params<P: serde::Serialize>(params: &P) -> Result<Value> {
    serde_json::to_value(params).map_err(|e| {
        CapsuleError::new(crate::codes::INVALID_REQUEST, format!("Invalid Request: {e}"))
    })
}
