//! Client configuration types.

use crate::error::ConfigError;
use std::time::Duration;

/// Default round-trip timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the JSON-RPC endpoint relative to the base URL.
pub const RPC_PATH: &str = "/rpc";

/// Path of the health endpoint relative to the base URL.
pub const HEALTH_PATH: &str = "/health";

/// Path prefix of the terminal WebSocket endpoint.
pub const TERMINAL_PATH: &str = "/terminal";

/// Configuration for a [`CapsuleClient`](crate::CapsuleClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the capsule server, without a trailing slash.
    pub base_url: String,
    /// Upper bound for a single round trip.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a config with the default timeout.
    ///
    /// The URL is not validated here; see [`ClientConfig::validate`].
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize(base_url.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a new config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::UnsupportedScheme(self.base_url.clone()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Full URL of the JSON-RPC endpoint.
    pub fn rpc_url(&self) -> String {
        format!("{}{RPC_PATH}", self.base_url)
    }

    /// Full URL of the health endpoint.
    pub fn health_url(&self) -> String {
        format!("{}{HEALTH_PATH}", self.base_url)
    }

    /// WebSocket URL of the terminal for a sandbox.
    ///
    /// `http://` becomes `ws://` and `https://` becomes `wss://`.
    pub fn terminal_url(&self, sandbox_id: &str) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{base}{TERMINAL_PATH}/{sandbox_id}")
    }
}

fn normalize(base_url: String) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: String,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Set the base URL (e.g. `http://localhost:8080`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the round-trip timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the configuration, validating all fields.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let config = ClientConfig {
            base_url: normalize(self.base_url),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        };
        config.validate()?;
        Ok(config)
    }
}
