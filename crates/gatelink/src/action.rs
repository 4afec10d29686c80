//! Connection action required by a received envelope.

/// Classification of a non-control envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadAction {
    /// Keep the connection open.
    Continue,
    /// The connection is no longer viable but the session may be resumed.
    Reconnect,
    /// Terminate without resuming.
    Disconnect {
        /// The peer refused the client; do not reconnect at all.
        fatal: bool,
    },
}

impl PayloadAction {
    /// Whether this action ends the receive loop.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Continue)
    }
}
