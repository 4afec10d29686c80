//! Error types for gatelink.

use std::time::Duration;

use gatelink_proto::ProtoError;
use thiserror::Error;

/// Failure reported by a transport half.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the connection without error.
    #[error("connection closed normally")]
    NormalClosure,

    /// The connection was closed with a non-normal code, or without a close frame.
    #[error("connection closed (code {code:?}): {reason}")]
    Closed {
        /// Close code, if the peer sent one.
        code: Option<u16>,
        /// Close reason.
        reason: String,
    },

    /// Network-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// An envelope could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] ProtoError),

    /// The peer violated the protocol.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// An operation did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Whether this is the distinguished normal-closure signal.
    #[must_use]
    pub const fn is_normal_closure(&self) -> bool {
        matches!(self, Self::NormalClosure)
    }
}

/// Why a run ended fatally.
#[derive(Debug, Error)]
pub enum EngineFault {
    /// The previous heartbeat was not acknowledged within one interval.
    #[error("heartbeat not acknowledged in time (interval {interval:?})")]
    HeartbeatTimeout {
        /// Configured heartbeat interval.
        interval: Duration,
    },

    /// Unrecoverable transport failure.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The classification policy marked the connection as fatally rejected.
    #[error("connection rejected: {0}")]
    Rejected(String),

    /// `run` was called while another run on the same engine is active.
    #[error("engine is already running")]
    AlreadyRunning,

    /// A loop panicked.
    #[error("internal fault: {0}")]
    Internal(String),
}

/// Errors raised outside a run: configuration and connection setup.
#[derive(Debug, Error)]
pub enum GatelinkError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Could not establish a connection.
    #[error("gateway connection failed: {0}")]
    Connect(#[from] TransportError),

    /// Envelope model error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
