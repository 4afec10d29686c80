//! The generic envelope wrapper.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Control, Opcode, ProtoError};

/// Event name of the dispatch that completes a handshake.
pub const READY_EVENT: &str = "READY";

/// An envelope carrying one inner message plus routing metadata.
///
/// Envelopes are immutable once built; the builder methods consume `self`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    op: Opcode,
    #[serde(rename = "d", default)]
    data: Value,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    sequence: Option<u64>,
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    event: Option<String>,
}

impl Payload {
    /// Create an envelope with the given opcode and inner data.
    #[must_use]
    pub const fn new(op: Opcode, data: Value) -> Self {
        Self {
            op,
            data,
            sequence: None,
            event: None,
        }
    }

    /// Create an envelope by serializing a typed inner message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be represented as JSON.
    pub fn encode<T: Serialize>(op: Opcode, message: &T) -> Result<Self, ProtoError> {
        let data =
            serde_json::to_value(message).map_err(|e| ProtoError::Encoding(e.to_string()))?;
        Ok(Self::new(op, data))
    }

    /// Create a dispatch envelope.
    #[must_use]
    pub fn dispatch(event: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self::new(Opcode::Dispatch, data)
            .with_event(event)
            .with_sequence(sequence)
    }

    /// Attach a sequence number.
    #[must_use]
    pub const fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Attach an event name.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Opcode of this envelope.
    #[must_use]
    pub const fn op(&self) -> Opcode {
        self.op
    }

    /// Raw inner data.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Sequence number, present on dispatches.
    #[must_use]
    pub const fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Event name, present on dispatches.
    #[must_use]
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// Recognize this envelope against the standard control set.
    #[must_use]
    pub fn control(&self) -> Control {
        match self.op {
            Opcode::Heartbeat => Control::Heartbeat,
            Opcode::HeartbeatAck => Control::HeartbeatAck,
            Opcode::Dispatch if self.event() == Some(READY_EVENT) => Control::Ready,
            _ => Control::Other,
        }
    }

    /// Decode the inner data as a typed message.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not match `T`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, ProtoError> {
        T::deserialize(&self.data).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Deserialize from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtoError> {
        serde_json::from_slice(bytes).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
