//! Engine and client configuration.
//!
//! [`EngineConfig`] parameterizes one engine. [`GatelinkConfig`] is the TOML
//! file read by the `gatelink` binary, covering the connection target,
//! credentials, engine timing and reconnection backoff.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GatelinkError;
use crate::reconnect::ReconnectConfig;

/// Default bound on the send loop's idle sleep.
pub const DEFAULT_POLL_QUANTUM: Duration = Duration::from_millis(50);

/// Timing parameters for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Heartbeat cadence, normally taken from the peer's hello.
    pub heartbeat_interval: Duration,
    /// Longest the send loop sleeps before re-checking the outbound queue.
    pub poll_quantum: Duration,
}

impl EngineConfig {
    /// Config with the given heartbeat interval and the default quantum.
    #[must_use]
    pub const fn with_interval(heartbeat_interval: Duration) -> Self {
        Self {
            heartbeat_interval,
            poll_quantum: DEFAULT_POLL_QUANTUM,
        }
    }

    /// Set the poll quantum.
    #[must_use]
    pub const fn with_poll_quantum(mut self, poll_quantum: Duration) -> Self {
        self.poll_quantum = poll_quantum;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either duration is zero.
    pub fn validate(&self) -> Result<(), GatelinkError> {
        if self.heartbeat_interval.is_zero() {
            return Err(GatelinkError::Config(
                "heartbeat interval must be greater than 0".to_string(),
            ));
        }
        if self.poll_quantum.is_zero() {
            return Err(GatelinkError::Config(
                "poll quantum must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSection {
    /// Send loop idle sleep bound in milliseconds.
    pub poll_quantum_ms: u64,
    /// How long to wait for the peer's hello in milliseconds.
    pub handshake_timeout_ms: u64,
    /// How long to wait for the connection to open in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            poll_quantum_ms: 50,
            handshake_timeout_ms: 10_000,
            connect_timeout_ms: 10_000,
        }
    }
}

/// `[reconnect]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReconnectSection {
    /// Initial backoff in milliseconds.
    pub initial_delay_ms: u64,
    /// Backoff cap in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff growth factor.
    pub backoff_multiplier: f64,
    /// Consecutive interrupted runs allowed before giving up.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
            max_attempts: None,
        }
    }
}

/// Client configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatelinkConfig {
    /// Gateway WebSocket URL.
    pub url: String,
    /// Authentication token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Event subscription bitmask sent when identifying.
    #[serde(default)]
    pub intents: u64,
    /// Engine timing.
    #[serde(default)]
    pub engine: EngineSection,
    /// Reconnection backoff.
    #[serde(default)]
    pub reconnect: ReconnectSection,
}

impl Default for GatelinkConfig {
    fn default() -> Self {
        Self {
            url: "wss://gateway.example.com/?v=10&encoding=json".to_string(),
            token: None,
            intents: 0,
            engine: EngineSection::default(),
            reconnect: ReconnectSection::default(),
        }
    }
}

impl GatelinkConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatelinkError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GatelinkError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, GatelinkError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| GatelinkError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, GatelinkError> {
        toml::to_string_pretty(self)
            .map_err(|e| GatelinkError::Config(format!("failed to render TOML: {e}")))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), GatelinkError> {
        if self.url.is_empty() {
            return Err(GatelinkError::Config("url cannot be empty".to_string()));
        }

        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(GatelinkError::Config(
                "url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.engine.poll_quantum_ms == 0 {
            return Err(GatelinkError::Config(
                "engine.poll_quantum_ms must be greater than 0".to_string(),
            ));
        }

        if self.engine.handshake_timeout_ms == 0 || self.engine.connect_timeout_ms == 0 {
            return Err(GatelinkError::Config(
                "engine timeouts must be greater than 0".to_string(),
            ));
        }

        if self.reconnect.initial_delay_ms == 0 {
            return Err(GatelinkError::Config(
                "reconnect.initial_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.reconnect.max_delay_ms < self.reconnect.initial_delay_ms {
            return Err(GatelinkError::Config(
                "reconnect.max_delay_ms must not be less than initial_delay_ms".to_string(),
            ));
        }

        if self.reconnect.backoff_multiplier.is_nan() || self.reconnect.backoff_multiplier < 1.0 {
            return Err(GatelinkError::Config(
                "reconnect.backoff_multiplier must be at least 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Engine configuration for a connection whose hello negotiated `heartbeat_interval`.
    #[must_use]
    pub const fn engine_config(&self, heartbeat_interval: Duration) -> EngineConfig {
        EngineConfig::with_interval(heartbeat_interval)
            .with_poll_quantum(Duration::from_millis(self.engine.poll_quantum_ms))
    }

    /// Backoff configuration.
    #[must_use]
    pub const fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.reconnect.initial_delay_ms),
            max_delay: Duration::from_millis(self.reconnect.max_delay_ms),
            backoff_multiplier: self.reconnect.backoff_multiplier,
            max_attempts: self.reconnect.max_attempts,
        }
    }

    /// Handshake timeout.
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.handshake_timeout_ms)
    }

    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.connect_timeout_ms)
    }
}
