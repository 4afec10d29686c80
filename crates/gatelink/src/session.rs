//! Orchestrator-side session bookkeeping.
//!
//! The engine never tracks sessions. A dispatcher draining the inbound buffer
//! feeds every envelope to [`ResumeState::observe`] so that, after a
//! resumable interruption, the orchestrator can ask the protocol for a resume
//! request instead of identifying again.

use gatelink_proto::{Control, Payload, Ready};
use tracing::{debug, warn};

/// Everything needed to resume a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeTicket {
    /// Session identifier from the ready notification.
    pub session_id: String,
    /// Last sequence number observed.
    pub sequence: u64,
}

/// Session id and sequence number observed on the inbound stream.
#[derive(Debug, Clone, Default)]
pub struct ResumeState {
    session_id: Option<String>,
    resume_url: Option<String>,
    sequence: Option<u64>,
}

impl ResumeState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from one inbound envelope.
    pub fn observe(&mut self, payload: &Payload) {
        if let Some(seq) = payload.sequence() {
            self.sequence = Some(self.sequence.map_or(seq, |current| current.max(seq)));
        }

        if payload.control() == Control::Ready {
            match Ready::from_payload(payload) {
                Ok(ready) => {
                    debug!(session_id = %ready.session_id, "session ready");
                    self.session_id = Some(ready.session_id);
                    self.resume_url = ready.resume_gateway_url;
                }
                Err(e) => warn!(error = %e, "malformed ready notification"),
            }
        }
    }

    /// Ticket for resuming, if a session was established.
    #[must_use]
    pub fn ticket(&self) -> Option<ResumeTicket> {
        Some(ResumeTicket {
            session_id: self.session_id.clone()?,
            sequence: self.sequence.unwrap_or(0),
        })
    }

    /// Endpoint the peer asked resumes to use.
    #[must_use]
    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }

    /// Forget the session, forcing a fresh identify.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
