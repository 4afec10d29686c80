//! Result of one engine run.

use crate::error::EngineFault;

/// Details of a recoverable interruption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interruption {
    /// Human-readable cause.
    pub reason: String,
    /// `true` to resume the session, `false` to start a fresh one.
    pub resume: bool,
}

impl Interruption {
    /// Interruption after which the session should be resumed.
    #[must_use]
    pub fn resumable(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            resume: true,
        }
    }

    /// Interruption after which a fresh session is required.
    #[must_use]
    pub fn fresh(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            resume: false,
        }
    }
}

/// How a call to [`GatewayEngine::run`](crate::GatewayEngine::run) ended.
#[derive(Debug)]
pub enum EngineOutcome {
    /// The caller requested shutdown.
    Success,
    /// The connection dropped; the orchestrator may reconnect.
    Recoverable(Interruption),
    /// The connection must not be retried.
    Fatal(EngineFault),
}

impl EngineOutcome {
    /// Whether the run ended by caller request.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the orchestrator may reconnect.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }

    /// Whether the run failed fatally.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Short label for logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Recoverable(_) => "recoverable",
            Self::Fatal(_) => "fatal",
        }
    }
}
