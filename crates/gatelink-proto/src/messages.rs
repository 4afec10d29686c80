//! Typed inner messages for the handshake and session lifecycle.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::payload::READY_EVENT;
use crate::{Opcode, Payload, ProtoError};

fn expect_op(payload: &Payload, op: Opcode, expected: &'static str) -> Result<(), ProtoError> {
    if payload.op() == op {
        Ok(())
    } else {
        Err(ProtoError::UnexpectedMessage {
            expected,
            actual: payload.op().code(),
        })
    }
}

/// First message on every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Heartbeat interval in milliseconds.
    pub heartbeat_interval: u64,
}

impl Hello {
    /// Create a hello message.
    #[must_use]
    pub const fn new(heartbeat_interval: Duration) -> Self {
        Self {
            heartbeat_interval: heartbeat_interval.as_millis() as u64,
        }
    }

    /// The negotiated heartbeat interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval)
    }

    /// Extract from an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope is not a hello or is malformed.
    pub fn from_payload(payload: &Payload) -> Result<Self, ProtoError> {
        expect_op(payload, Opcode::Hello, "hello")?;
        payload.decode_data()
    }

    /// Wrap in an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_payload(&self) -> Result<Payload, ProtoError> {
        Payload::encode(Opcode::Hello, self)
    }
}

/// Inner data of the `READY` dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ready {
    /// Session identifier used for resuming.
    pub session_id: String,
    /// Endpoint to reconnect to when resuming, if the peer provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_gateway_url: Option<String>,
}

impl Ready {
    /// Extract from an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope is not the `READY` dispatch.
    pub fn from_payload(payload: &Payload) -> Result<Self, ProtoError> {
        expect_op(payload, Opcode::Dispatch, "ready")?;
        if payload.event() != Some(READY_EVENT) {
            return Err(ProtoError::UnexpectedMessage {
                expected: "ready",
                actual: payload.op().code(),
            });
        }
        payload.decode_data()
    }
}

/// Client properties reported when identifying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProperties {
    /// Operating system.
    pub os: String,
    /// Library name.
    pub browser: String,
    /// Device name.
    pub device: String,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "gatelink".to_string(),
            device: "gatelink".to_string(),
        }
    }
}

/// Start a fresh session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identify {
    /// Authentication token.
    pub token: String,
    /// Event subscription bitmask.
    pub intents: u64,
    /// Client properties.
    pub properties: ConnectionProperties,
}

impl Identify {
    /// Create an identify message with default properties.
    #[must_use]
    pub fn new(token: impl Into<String>, intents: u64) -> Self {
        Self {
            token: token.into(),
            intents,
            properties: ConnectionProperties::default(),
        }
    }

    /// Wrap in an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_payload(&self) -> Result<Payload, ProtoError> {
        Payload::encode(Opcode::Identify, self)
    }
}

/// Continue a previous session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    /// Authentication token.
    pub token: String,
    /// Session being resumed.
    pub session_id: String,
    /// Last sequence number received.
    pub seq: u64,
}

impl Resume {
    /// Wrap in an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_payload(&self) -> Result<Payload, ProtoError> {
        Payload::encode(Opcode::Resume, self)
    }
}

/// Notice that the current session is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSession {
    /// Whether the session may still be resumed.
    pub resumable: bool,
}

impl InvalidSession {
    /// Extract from an envelope. Missing or non-boolean data means not resumable.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope is not an invalid-session notice.
    pub fn from_payload(payload: &Payload) -> Result<Self, ProtoError> {
        expect_op(payload, Opcode::InvalidSession, "invalid session")?;
        Ok(Self {
            resumable: payload.data().as_bool().unwrap_or(false),
        })
    }
}
