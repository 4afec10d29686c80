//! Coarse engine lifecycle marker, for observability only.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one engine: `Offline -> Connecting -> Connected -> Disconnecting -> Offline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// No run in progress.
    Offline,
    /// Run started, nothing received yet.
    Connecting,
    /// The peer has sent at least one envelope.
    Connected,
    /// A terminal outcome was reached; loops are being torn down.
    Disconnecting,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Offline => "offline",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// Atomic wrapper for engine status.
#[derive(Debug)]
pub struct AtomicEngineStatus(AtomicU8);

impl AtomicEngineStatus {
    /// Create a new atomic status.
    #[must_use]
    pub const fn new(status: EngineStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    /// Load the current status.
    #[must_use]
    pub fn load(&self) -> EngineStatus {
        match self.0.load(Ordering::SeqCst) {
            0 => EngineStatus::Offline,
            1 => EngineStatus::Connecting,
            2 => EngineStatus::Connected,
            _ => EngineStatus::Disconnecting,
        }
    }

    /// Store a new status.
    pub fn store(&self, status: EngineStatus) {
        self.0.store(status as u8, Ordering::SeqCst);
    }

    /// Move from `from` to `to` only if the current status is `from`.
    pub fn advance(&self, from: EngineStatus, to: EngineStatus) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_enum() {
        assert_eq!(EngineStatus::Offline as u8, 0);
        assert_eq!(EngineStatus::Connecting as u8, 1);
        assert_eq!(EngineStatus::Connected as u8, 2);
        assert_eq!(EngineStatus::Disconnecting as u8, 3);
    }

    #[test]
    fn test_atomic_status() {
        let status = AtomicEngineStatus::new(EngineStatus::Offline);
        assert_eq!(status.load(), EngineStatus::Offline);

        status.store(EngineStatus::Connecting);
        assert_eq!(status.load(), EngineStatus::Connecting);

        status.store(EngineStatus::Disconnecting);
        assert_eq!(status.load(), EngineStatus::Disconnecting);
    }

    #[test]
    fn test_advance_only_from_expected() {
        let status = AtomicEngineStatus::new(EngineStatus::Connecting);
        assert!(status.advance(EngineStatus::Connecting, EngineStatus::Connected));
        assert!(!status.advance(EngineStatus::Connecting, EngineStatus::Connected));
        assert_eq!(status.load(), EngineStatus::Connected);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(EngineStatus::Connected.to_string(), "connected");
        assert_eq!(EngineStatus::Offline.to_string(), "offline");
    }
}
