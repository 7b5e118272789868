//! JSON-RPC 2.0 client.
//!
//! Each [`RpcClient::call`] allocates the next request id, sends exactly one
//! request through the [`Transport`], and classifies the response into either
//! a result value or a [`CapsuleError`]. Nothing is retried.

use crate::error::{codes, CapsuleError, Result};
use crate::transport::Transport;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Protocol version sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// Request identifier.
    pub id: u64,
    /// Method name to invoke.
    pub method: &'a str,
    /// Method parameters, omitted when absent or empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Default, Deserialize)]
pub struct Response {
    /// Request identifier echoed by the server.
    #[serde(default)]
    pub id: Option<Value>,
    /// Result on success.
    #[serde(default)]
    pub result: Value,
    /// Error on failure.
    #[serde(default)]
    pub error: Value,
}

impl Response {
    /// Classify the envelope.
    ///
    /// A truthy `error` always wins; otherwise `result` is returned as-is,
    /// which may be `null`.
    pub fn into_result(self) -> Result<Value> {
        if is_truthy(&self.error) {
            return Err(CapsuleError::from_error_object(self.error));
        }
        Ok(self.result)
    }
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// JSON-RPC client over a [`Transport`].
///
/// The request-id counter is the only mutable state. It is atomic, so one
/// client may be shared between tasks and ids stay unique per instance.
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client over the given transport. The first request uses id 1.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Create a client over a shared transport.
    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of requests issued so far, which is also the last id used.
    pub fn requests_sent(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// The underlying transport.
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Send a request and return the raw `result` value.
    ///
    /// # Errors
    ///
    /// - code `-1` when the transport fails (status or connection),
    /// - the server's code/message/data when the response carries an error,
    /// - [`codes::INVALID_RESPONSE`] when the body is not a JSON-RPC envelope,
    /// - [`codes::INVALID_REQUEST`] when `method` is empty (nothing is sent).
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if method.is_empty() {
            return Err(CapsuleError::new(
                codes::INVALID_REQUEST,
                "method must not be empty",
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let request = Request {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params: params.filter(is_truthy),
        };

        let body = serde_json::to_vec(&request).map_err(|e| {
            CapsuleError::new(codes::INVALID_REQUEST, format!("Invalid Request: {e}"))
        })?;
        tracing::debug!(method = %method, id, "Sending RPC request");
        tracing::trace!(request = %String::from_utf8_lossy(&body), "RPC request body");

        let start = std::time::Instant::now();
        let raw = match self.transport.round_trip(body).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(method = %method, id, error = %e, "RPC transport failure");
                return Err(e.into());
            }
        };
        tracing::trace!(response = %String::from_utf8_lossy(&raw), "RPC response body");

        let response: Response =
            serde_json::from_slice(&raw).map_err(CapsuleError::invalid_response)?;

        match response.into_result() {
            Ok(result) => {
                tracing::debug!(
                    method = %method,
                    id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "RPC call successful"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::debug!(method = %method, id, code = e.code, message = %e.message, "RPC error response");
                Err(e)
            }
        }
    }

    /// Send typed parameters and decode the result into `R`.
    ///
    /// Every field of `R` that is not explicitly optional must be present in
    /// the result; absence is reported as [`codes::INVALID_RESPONSE`].
    pub async fn call_typed<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R> {
        let params = serde_json::to_value(params).map_err(|e| {
            CapsuleError::new(codes::INVALID_REQUEST, format!("Invalid Request: {e}"))
        })?;
        let result = self.call(method, Some(params)).await?;
        serde_json::from_value(result).map_err(CapsuleError::invalid_response)
    }
}
