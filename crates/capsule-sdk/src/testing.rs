//! Scripted transport for unit tests.

use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::sync::{Arc, Mutex};

type Handler = Box<dyn Fn(&Value) -> Result<Vec<u8>, TransportError> + Send + Sync>;

/// Shared record of every request envelope a [`MockTransport`] received.
#[derive(Clone, Default)]
pub(crate) struct RequestLog(Arc<Mutex<Vec<Value>>>);

impl RequestLog {
    pub(crate) fn requests(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// Transport that answers each request with a closure.
pub(crate) struct MockTransport {
    handler: Handler,
    log: RequestLog,
}

impl MockTransport {
    /// Answer with a JSON response envelope.
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        Self::raw(move |req| handler(req).map(|v| serde_json::to_vec(&v).unwrap()))
    }

    /// Answer with raw bytes.
    pub(crate) fn raw<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> Result<Vec<u8>, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            log: RequestLog::default(),
        }
    }

    pub(crate) fn log(&self) -> RequestLog {
        self.log.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn round_trip(&self, body: Vec<u8>) -> Result<Bytes, TransportError> {
        let request: Value = serde_json::from_slice(&body).unwrap();
        self.log.0.lock().unwrap().push(request.clone());
        (self.handler)(&request).map(Bytes::from)
    }

    async fn health(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
