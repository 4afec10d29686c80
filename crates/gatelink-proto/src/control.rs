//! Control messages recognized structurally by the connection engine.

/// Classification of an envelope at the decode boundary.
///
/// The engine intercepts [`Control::Heartbeat`] and [`Control::HeartbeatAck`]
/// itself. Everything else is buffered for the application and passed to the
/// protocol's classification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// The peer asks for an immediate heartbeat acknowledgement.
    Heartbeat,
    /// The peer acknowledged our last heartbeat.
    HeartbeatAck,
    /// The session is established.
    Ready,
    /// Any other envelope.
    Other,
}

impl Control {
    /// Whether the engine consumes this envelope without buffering it.
    #[must_use]
    pub const fn is_intercepted(self) -> bool {
        matches!(self, Self::Heartbeat | Self::HeartbeatAck)
    }
}
