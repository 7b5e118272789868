//! Request/response channel beneath the JSON-RPC client.
//!
//! The RPC layer only needs to hand over a serialized body and get a body
//! back. [`HttpTransport`] does this with an HTTP POST to `<base>/rpc`.

use crate::config::ClientConfig;
use crate::error::{codes, CapsuleError, ConfigError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error;

/// Failure below the JSON-RPC layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP Error: {status} {reason}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// No response was obtained (DNS, refused connection, timeout, ...).
    #[error("Connection Error: {0}")]
    Connection(String),
}

impl From<TransportError> for CapsuleError {
    fn from(err: TransportError) -> Self {
        CapsuleError::new(codes::TRANSPORT, err.to_string())
    }
}

/// A reliable request/response channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request body and wait for the response body.
    async fn round_trip(&self, body: Vec<u8>) -> Result<Bytes, TransportError>;

    /// Check that the server is reachable.
    async fn health(&self) -> Result<(), TransportError>;
}

/// HTTP transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    rpc_url: String,
    health_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport for the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("capsule-sdk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            rpc_url: config.rpc_url(),
            health_url: config.health_url(),
            timeout: config.timeout,
        })
    }

    fn connection_error(&self, url: &str, err: reqwest::Error) -> TransportError {
        let reason = if err.is_timeout() {
            format!("timed out after {:?}", self.timeout)
        } else {
            describe(&err)
        };
        tracing::debug!(url = %url, reason = %reason, "Transport failure");
        TransportError::Connection(reason)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn round_trip(&self, body: Vec<u8>) -> Result<Bytes, TransportError> {
        tracing::trace!(url = %self.rpc_url, len = body.len(), "POST");
        let response = self
            .http
            .post(&self.rpc_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.connection_error(&self.rpc_url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %self.rpc_url, status = status.as_u16(), "Non-success HTTP status");
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| self.connection_error(&self.rpc_url, e))
    }

    async fn health(&self) -> Result<(), TransportError> {
        let response = self
            .http
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| self.connection_error(&self.health_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        Ok(())
    }
}

/// Render an error together with its source chain.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
