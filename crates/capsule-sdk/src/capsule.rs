//! Capsule handle - a created sandbox bound to the client that created it.

use crate::client::{delete_sandbox, CapsuleClient, DEFAULT_WORKSPACE};
use crate::error::{CapsuleError, Error, Result};
use crate::rpc::RpcClient;
use crate::template::Template;
use crate::types::{ExecOptions, ExecResult, FileInfo, TextEncoding};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// A sandbox returned by [`CapsuleClient::create`].
///
/// The handle borrows its client and keeps no local state about validity.
/// After [`Capsule::delete`] the sandbox is gone on the server; any further
/// use of its id (through the client) fails with a server error.
pub struct Capsule<'c> {
    client: &'c CapsuleClient,
    id: String,
    template: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<'c> Capsule<'c> {
    pub(crate) fn new(
        client: &'c CapsuleClient,
        id: String,
        template: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            client,
            id,
            template,
            created_at,
            expires_at,
        }
    }

    /// Get the sandbox ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Template reported by the server.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Get the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the server will expire the sandbox.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// The client this capsule talks through.
    pub fn client(&self) -> &'c CapsuleClient {
        self.client
    }

    /// Execute a command.
    pub async fn exec<I, S>(&self, cmd: I, options: &ExecOptions) -> Result<ExecResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.client.exec(&self.id, cmd, options).await
    }

    /// Run code with the strategy of this capsule's template.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownLanguage`] if the template has no run strategy; no
    /// request is made in that case.
    pub async fn run(&self, code: &str) -> Result<ExecResult, Error> {
        let language: Template = self.template.parse()?;
        self.run_as(code, language).await
    }

    /// Run code with an explicit language.
    ///
    /// Go code is written to `/workspace/main.go` and run from there, which
    /// takes two requests.
    pub async fn run_as(&self, code: &str, language: Template) -> Result<ExecResult, Error> {
        tracing::debug!(sandbox_id = %self.id, language = %language, code_len = code.len(), "Running code");
        let plan = language.run_plan(code);
        if let Some(source) = &plan.source {
            self.write_file(source.path, &source.content).await?;
        }
        Ok(self.exec(plan.cmd, &ExecOptions::default()).await?)
    }

    /// Write a file.
    pub async fn write_file(&self, path: &str, content: impl AsRef<[u8]>) -> Result<()> {
        self.client.write_file(&self.id, path, content).await
    }

    /// Read a file as raw bytes.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.client.read_file(&self.id, path).await
    }

    /// Read a file and decode it as text.
    pub async fn read_file_text(&self, path: &str, encoding: TextEncoding) -> Result<String, Error> {
        self.client.read_file_text(&self.id, path, encoding).await
    }

    /// List a directory.
    pub async fn list_dir(&self, path: &str) -> Result<Vec<FileInfo>> {
        self.client.list_dir(&self.id, path).await
    }

    /// List `/workspace`.
    pub async fn list_workspace(&self) -> Result<Vec<FileInfo>> {
        self.list_dir(DEFAULT_WORKSPACE).await
    }

    /// WebSocket URL of this capsule's terminal.
    pub fn terminal_url(&self) -> String {
        self.client.terminal_url(&self.id)
    }

    /// Delete the sandbox.
    pub async fn delete(self) -> Result<()> {
        self.client.delete(&self.id).await
    }

    /// Hand the capsule to `f` and delete it once `f` is done.
    ///
    /// The delete is issued whether `f` returns `Ok`, returns `Err` or
    /// panics. A panic is resumed after the delete. If the delete fails, its
    /// error is returned in place of `f`'s result.
    ///
    /// If the returned future is dropped before it completes, the delete is
    /// spawned onto the current tokio runtime instead.
    pub async fn scoped<F, Fut, T, E>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(Capsule<'c>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CapsuleError>,
    {
        let client = self.client;
        let id = self.id.clone();
        tracing::debug!(sandbox_id = %id, "Entering capsule scope");
        let mut guard = DeleteOnDrop::new(client.shared_rpc(), id.clone());

        let outcome = AssertUnwindSafe(async move { f(self).await })
            .catch_unwind()
            .await;
        let cleanup = client.delete(&id).await;
        guard.disarm();

        let body = match outcome {
            Ok(body) => body,
            Err(panic) => {
                if let Err(e) = &cleanup {
                    tracing::warn!(sandbox_id = %id, error = %e, "Delete after panic failed");
                }
                std::panic::resume_unwind(panic);
            }
        };

        if let Err(e) = cleanup {
            if body.is_err() {
                tracing::warn!(sandbox_id = %id, "Scope failed and delete failed; returning the delete error");
            }
            return Err(e.into());
        }
        body
    }
}

/// Deletes the sandbox in the background if a scope is cancelled.
struct DeleteOnDrop {
    rpc: Option<Arc<RpcClient>>,
    id: String,
}

impl DeleteOnDrop {
    fn new(rpc: Arc<RpcClient>, id: String) -> Self {
        Self { rpc: Some(rpc), id }
    }

    fn disarm(&mut self) {
        self.rpc = None;
    }
}

impl Drop for DeleteOnDrop {
    fn drop(&mut self) {
        let Some(rpc) = self.rpc.take() else {
            return;
        };
        let id = std::mem::take(&mut self.id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(sandbox_id = %id, "Scope cancelled, deleting in background");
                handle.spawn(async move {
                    if let Err(e) = delete_sandbox(&rpc, &id).await {
                        tracing::warn!(sandbox_id = %id, error = %e, "Background delete failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(sandbox_id = %id, "Scope cancelled outside a tokio runtime; sandbox left to expire");
            }
        }
    }
}

impl fmt::Debug for Capsule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capsule")
            .field("id", &self.id)
            .field("template", &self.template)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
