//! The standard gateway opcode table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtoError;

/// Opcode carried by every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Opcode {
    /// An application event (peer to client).
    Dispatch,
    /// Liveness probe, sent by either side.
    Heartbeat,
    /// Start a fresh session (client to peer).
    Identify,
    /// Update client presence (client to peer).
    PresenceUpdate,
    /// Update voice state (client to peer).
    VoiceStateUpdate,
    /// Continue a previous session (client to peer).
    Resume,
    /// Peer asks the client to reconnect and resume.
    Reconnect,
    /// Request member chunks (client to peer).
    RequestMembers,
    /// The session is no longer valid.
    InvalidSession,
    /// First envelope on a connection, carries the heartbeat interval.
    Hello,
    /// Acknowledgement of a client heartbeat.
    HeartbeatAck,
}

impl Opcode {
    /// Numeric value on the wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Dispatch => 0,
            Self::Heartbeat => 1,
            Self::Identify => 2,
            Self::PresenceUpdate => 3,
            Self::VoiceStateUpdate => 4,
            Self::Resume => 6,
            Self::Reconnect => 7,
            Self::RequestMembers => 8,
            Self::InvalidSession => 9,
            Self::Hello => 10,
            Self::HeartbeatAck => 11,
        }
    }

    /// Whether only the client is expected to send this opcode.
    #[must_use]
    pub const fn is_client_only(self) -> bool {
        matches!(
            self,
            Self::Identify
                | Self::PresenceUpdate
                | Self::VoiceStateUpdate
                | Self::Resume
                | Self::RequestMembers
        )
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ProtoError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            3 => Self::PresenceUpdate,
            4 => Self::VoiceStateUpdate,
            6 => Self::Resume,
            7 => Self::Reconnect,
            8 => Self::RequestMembers,
            9 => Self::InvalidSession,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            other => return Err(ProtoError::UnknownOpcode(other)),
        })
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op.code()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}
