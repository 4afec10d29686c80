//! Reconnection backoff and recovery planning for orchestrators.
//!
//! The engine never retries. An orchestrator drives repeated runs and uses
//! [`ReconnectConfig::plan`] to turn each [`EngineOutcome`] into a decision.

use std::time::Duration;

use crate::outcome::EngineOutcome;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Initial delay before first reconnection attempt.
    pub initial_delay: Duration,
    /// Maximum delay between reconnection attempts.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Maximum number of reconnection attempts (None = infinite).
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            max_attempts: None,
        }
    }
}

/// What the orchestrator should do after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPlan {
    /// The caller asked for shutdown.
    Stop,
    /// Reconnect after `delay`, resuming the session if `resume` is set.
    Retry {
        /// Backoff before the next attempt.
        delay: Duration,
        /// Resume rather than identify.
        resume: bool,
    },
    /// Give up: the outcome was fatal or attempts are exhausted.
    Abort,
}

impl ReconnectConfig {
    /// Calculate delay for the given attempt number.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt,
            self.initial_delay,
            self.max_delay,
            self.backoff_multiplier,
        )
    }

    /// Check if we should attempt reconnection.
    #[must_use]
    pub fn should_reconnect(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }

    /// Decide the next step after `outcome`, `attempt` being the number of
    /// consecutive interrupted runs including this one.
    #[must_use]
    pub fn plan(&self, outcome: &EngineOutcome, attempt: u32) -> RecoveryPlan {
        match outcome {
            EngineOutcome::Success => RecoveryPlan::Stop,
            EngineOutcome::Fatal(_) => RecoveryPlan::Abort,
            EngineOutcome::Recoverable(interruption) => {
                if self.should_reconnect(attempt) {
                    RecoveryPlan::Retry {
                        delay: self.delay_for_attempt(attempt),
                        resume: interruption.resume,
                    }
                } else {
                    RecoveryPlan::Abort
                }
            }
        }
    }
}

/// Calculate reconnection delay using exponential backoff.
#[must_use]
pub fn calculate_backoff(
    attempt: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
) -> Duration {
    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let factor = multiplier.powi(exponent);
    let delay_millis = initial_delay.as_millis() as f64 * factor;
    if !delay_millis.is_finite() || delay_millis >= max_delay.as_millis() as f64 {
        return max_delay;
    }
    Duration::from_millis(delay_millis as u64).min(max_delay)
}
