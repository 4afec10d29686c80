//! Heartbeat cadence and acknowledgement tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::EngineFault;

/// Time of the most recent heartbeat acknowledgement.
///
/// Written by the receive loop, read by the send loop. Stored as microseconds
/// since the clock's epoch plus one, so zero means "never acknowledged".
/// Updates use `fetch_max`, so the recorded time never moves backward.
#[derive(Debug)]
pub struct AckClock {
    epoch: Instant,
    last_ack: AtomicU64,
}

impl AckClock {
    /// Create a clock with no acknowledgement recorded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last_ack: AtomicU64::new(0),
        }
    }

    fn encode(&self, at: Instant) -> u64 {
        let micros = at.saturating_duration_since(self.epoch).as_micros();
        u64::try_from(micros).unwrap_or(u64::MAX - 1) + 1
    }

    /// Record an acknowledgement received at `at`.
    pub fn record(&self, at: Instant) {
        self.last_ack.fetch_max(self.encode(at), Ordering::SeqCst);
    }

    /// Time of the latest acknowledgement, if any.
    #[must_use]
    pub fn last(&self) -> Option<Instant> {
        match self.last_ack.load(Ordering::SeqCst) {
            0 => None,
            encoded => Some(self.epoch + Duration::from_micros(encoded - 1)),
        }
    }

    /// Whether an acknowledgement was recorded at or after `sent`.
    #[must_use]
    pub fn acknowledged_since(&self, sent: Instant) -> bool {
        self.last_ack.load(Ordering::SeqCst) >= self.encode(sent)
    }
}

impl Default for AckClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Send-loop-local heartbeat state.
#[derive(Debug)]
pub struct HeartbeatGovernor<'a> {
    interval: Duration,
    last_sent: Option<Instant>,
    acks: &'a AckClock,
}

impl<'a> HeartbeatGovernor<'a> {
    /// Create a governor that has not sent any heartbeat yet.
    #[must_use]
    pub const fn new(interval: Duration, acks: &'a AckClock) -> Self {
        Self {
            interval,
            last_sent: None,
            acks,
        }
    }

    /// Configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// When the last heartbeat was sent.
    #[must_use]
    pub const fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }

    /// Whether a heartbeat must be sent at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_sent
            .is_none_or(|sent| now.saturating_duration_since(sent) >= self.interval)
    }

    /// Verify the previous heartbeat, if any, was acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`EngineFault::HeartbeatTimeout`] if no acknowledgement arrived
    /// since the previous heartbeat was sent.
    pub fn check_acknowledged(&self) -> Result<(), EngineFault> {
        match self.last_sent {
            Some(sent) if !self.acks.acknowledged_since(sent) => {
                Err(EngineFault::HeartbeatTimeout {
                    interval: self.interval,
                })
            }
            _ => Ok(()),
        }
    }

    /// Record that a heartbeat was sent at `at`.
    pub fn record_sent(&mut self, at: Instant) {
        self.last_sent = Some(at);
    }

    /// When the next heartbeat falls due.
    #[must_use]
    pub fn next_deadline(&self, now: Instant) -> Instant {
        self.last_sent.map_or(now, |sent| sent + self.interval)
    }
}
