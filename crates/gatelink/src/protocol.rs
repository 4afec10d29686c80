//! Protocol specialization: envelope factories and the classification policy.

use gatelink_proto::{Control, Identify, InvalidSession, Opcode, Payload, ProtoError, Resume};
use serde_json::Value;

use crate::action::PayloadAction;
use crate::session::ResumeTicket;

/// Capabilities a protocol variant supplies to the engine.
///
/// `classify` must be total, side-effect free and non-blocking: it runs inline
/// in the receive loop for every non-control envelope.
pub trait Protocol: Send + Sync {
    /// Build a heartbeat envelope.
    fn heartbeat(&self) -> Payload;

    /// Build the acknowledgement for a peer-initiated heartbeat.
    fn heartbeat_ack(&self) -> Payload;

    /// Build a request to resume `ticket`'s session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be encoded.
    fn resume_request(&self, ticket: &ResumeTicket) -> Result<Payload, ProtoError>;

    /// Recognize control envelopes.
    fn recognize(&self, payload: &Payload) -> Control {
        payload.control()
    }

    /// Decide what the connection must do after receiving `payload`.
    fn classify(&self, payload: &Payload) -> PayloadAction;
}

/// The standard opcode table with token authentication.
#[derive(Clone)]
pub struct StandardProtocol {
    token: String,
    intents: u64,
}

impl StandardProtocol {
    /// Create a protocol instance authenticating with `token`.
    #[must_use]
    pub fn new(token: impl Into<String>, intents: u64) -> Self {
        Self {
            token: token.into(),
            intents,
        }
    }

    /// Build the identify envelope that starts a fresh session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be encoded.
    pub fn identify(&self) -> Result<Payload, ProtoError> {
        Identify::new(self.token.clone(), self.intents).to_payload()
    }
}

impl std::fmt::Debug for StandardProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardProtocol")
            .field("token", &"<redacted>")
            .field("intents", &self.intents)
            .finish()
    }
}

impl Protocol for StandardProtocol {
    fn heartbeat(&self) -> Payload {
        Payload::new(Opcode::Heartbeat, Value::Null)
    }

    fn heartbeat_ack(&self) -> Payload {
        Payload::new(Opcode::HeartbeatAck, Value::Null)
    }

    fn resume_request(&self, ticket: &ResumeTicket) -> Result<Payload, ProtoError> {
        Resume {
            token: self.token.clone(),
            session_id: ticket.session_id.clone(),
            seq: ticket.sequence,
        }
        .to_payload()
    }

    fn classify(&self, payload: &Payload) -> PayloadAction {
        match payload.op() {
            Opcode::Reconnect => PayloadAction::Reconnect,
            Opcode::InvalidSession => match InvalidSession::from_payload(payload) {
                Ok(notice) if notice.resumable => PayloadAction::Reconnect,
                _ => PayloadAction::Disconnect { fatal: false },
            },
            op if op.is_client_only() => PayloadAction::Disconnect { fatal: true },
            _ => PayloadAction::Continue,
        }
    }
}
