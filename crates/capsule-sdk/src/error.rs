//! Error types for capsule-sdk.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for capsule-sdk operations.
///
/// Remote operations fail with [`CapsuleError`]; composite operations such as
/// [`Capsule::run`](crate::Capsule::run) use [`Error`] instead.
pub type Result<T, E = CapsuleError> = std::result::Result<T, E>;

/// Well-known error codes.
pub mod codes {
    /// Transport failure, or a server error object without a code.
    pub const TRANSPORT: i64 = -1;
    /// The response body or result could not be decoded.
    pub const INVALID_RESPONSE: i64 = -32700;
    /// The request could not be built locally.
    pub const INVALID_REQUEST: i64 = -32600;
    /// The server does not know the method.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// The server rejected the parameters.
    pub const INVALID_PARAMS: i64 = -32001;
    /// The server failed to start the sandbox container.
    pub const CONTAINER_CREATE_FAILED: i64 = -32003;
    /// The command exceeded its server-side time limit.
    pub const EXEC_TIMEOUT: i64 = -32004;
    /// The command could not be executed.
    pub const EXEC_FAILED: i64 = -32005;
    /// The sandbox could not be deleted.
    pub const DELETE_FAILED: i64 = -32007;
}

/// A failed remote operation.
///
/// Transport failures, connection failures and error objects returned by the
/// server all collapse into this one type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("RPC Error {code}: {message}")]
pub struct CapsuleError {
    /// Error code (`-1` for transport-level failures).
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Additional data attached by the server.
    pub data: Option<Value>,
}

impl CapsuleError {
    /// Create an error without attached data.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach server-provided data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Error raised when a response does not have the expected shape.
    pub(crate) fn invalid_response(reason: impl std::fmt::Display) -> Self {
        Self::new(
            codes::INVALID_RESPONSE,
            format!("Invalid Response: {reason}"),
        )
    }

    /// Build an error from a server `error` member.
    ///
    /// Missing codes default to `-1` and missing messages to `Unknown error`.
    pub(crate) fn from_error_object(error: Value) -> Self {
        match error {
            Value::Object(mut obj) => {
                let code = obj
                    .get("code")
                    .and_then(Value::as_i64)
                    .unwrap_or(codes::TRANSPORT);
                let message = obj
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string();
                let data = obj.remove("data").filter(|d| !d.is_null());
                Self {
                    code,
                    message,
                    data,
                }
            }
            Value::String(message) => Self::new(codes::TRANSPORT, message),
            _ => Self::new(codes::TRANSPORT, "Unknown error"),
        }
    }

    /// Server error category from `data.type`, e.g. `EXEC_TIMEOUT`.
    pub fn error_type(&self) -> Option<&str> {
        self.data.as_ref()?.get("type")?.as_str()
    }

    /// Whether the server marked the failure as retryable.
    ///
    /// The SDK never retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.get("retryable"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Server-provided details from `data.details`.
    pub fn details(&self) -> Option<&Value> {
        self.data.as_ref()?.get("details")
    }
}

/// Errors from composite operations that can fail before reaching the server.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote operation failed.
    #[error(transparent)]
    Rpc(#[from] CapsuleError),

    /// No run strategy exists for the language.
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// File content is not valid in the requested text encoding.
    #[error("cannot decode file as {encoding}: {reason}")]
    Decode {
        /// Encoding that was requested.
        encoding: &'static str,
        /// What went wrong.
        reason: String,
    },
}

impl Error {
    /// The remote error, if this failure came from the server or transport.
    pub fn as_rpc(&self) -> Option<&CapsuleError> {
        match self {
            Self::Rpc(e) => Some(e),
            _ => None,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("base URL is required")]
    MissingBaseUrl,

    #[error("base URL must start with http:// or https://: {0}")]
    UnsupportedScheme(String),

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
