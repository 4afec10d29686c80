//! The gateway connection engine.
//!
//! One [`GatewayEngine::run`] drives one connection: a send loop (outbound
//! queue plus heartbeats) and a receive loop (control interception plus
//! classification) race under a shared cancellation scope. Whichever reaches
//! a terminal state first wins; the other loop's future is dropped before the
//! outcome is derived, so nothing keeps running once `run` returns.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use gatelink_proto::{Control, Opcode, Payload};
use tokio::sync::{mpsc, Mutex};
use tokio::task::yield_now;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::action::PayloadAction;
use crate::config::EngineConfig;
use crate::error::{EngineFault, TransportError};
use crate::heartbeat::{AckClock, HeartbeatGovernor};
use crate::outcome::{EngineOutcome, Interruption};
use crate::protocol::Protocol;
use crate::status::{AtomicEngineStatus, EngineStatus};
use crate::transport::{PayloadSink, PayloadSource, Transport};

/// Receiving end of the inbound buffer.
pub type InboundReceiver = mpsc::UnboundedReceiver<Payload>;

/// Cloneable handle for submitting commands from other tasks.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Payload>,
}

impl CommandSender {
    /// Enqueue an outbound envelope. Returns `false` if the engine is gone.
    pub fn submit(&self, payload: Payload) -> bool {
        self.tx.send(payload).is_ok()
    }
}

/// Why a loop stopped.
#[derive(Debug)]
enum LoopExit {
    /// The caller's cancellation signal fired.
    Cancelled,
    /// The classification policy returned a terminal action.
    Action { action: PayloadAction, op: Opcode },
    /// A transport half failed.
    Transport(TransportError),
    /// Liveness failure or internal fault.
    Fault(EngineFault),
}

impl LoopExit {
    fn panicked(name: &str, panic: &(dyn Any + Send)) -> Self {
        let message = panic
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::Fault(EngineFault::Internal(format!("{name} loop panicked: {message}")))
    }
}

/// Map a loop exit onto the run's outcome.
fn resolve(exit: LoopExit, caller_cancelled: bool) -> EngineOutcome {
    match exit {
        LoopExit::Cancelled => EngineOutcome::Success,
        LoopExit::Action { action, op } => match action {
            PayloadAction::Reconnect => EngineOutcome::Recoverable(Interruption::resumable(
                format!("peer requested reconnect ({op})"),
            )),
            PayloadAction::Disconnect { fatal: true } => {
                EngineOutcome::Fatal(EngineFault::Rejected(format!("peer rejected session ({op})")))
            }
            // Only reachable when the token fires from another thread after the
            // select polled its cancel branch but before the receive loop returned.
            PayloadAction::Disconnect { fatal: false } if caller_cancelled => {
                EngineOutcome::Success
            }
            PayloadAction::Disconnect { fatal: false } => EngineOutcome::Recoverable(
                Interruption::fresh(format!("peer ended session ({op})")),
            ),
            PayloadAction::Continue => EngineOutcome::Fatal(EngineFault::Internal(
                "receive loop stopped on a non-terminal action".to_string(),
            )),
        },
        LoopExit::Transport(e) if e.is_normal_closure() => {
            EngineOutcome::Recoverable(Interruption::resumable(e.to_string()))
        }
        LoopExit::Transport(e) => EngineOutcome::Fatal(EngineFault::Transport(e)),
        LoopExit::Fault(fault) => EngineOutcome::Fatal(fault),
    }
}

/// Client-side engine for one gateway connection.
pub struct GatewayEngine {
    protocol: Arc<dyn Protocol>,
    config: EngineConfig,
    status: AtomicEngineStatus,
    acks: AckClock,
    outbound_tx: mpsc::UnboundedSender<Payload>,
    outbound_rx: Mutex<mpsc::UnboundedReceiver<Payload>>,
    inbound_tx: mpsc::UnboundedSender<Payload>,
}

impl GatewayEngine {
    /// Create an engine and the receiving end of its inbound buffer.
    ///
    /// Every non-control envelope received during a run is appended to the
    /// buffer before it is classified.
    #[must_use]
    pub fn new(protocol: Arc<dyn Protocol>, config: EngineConfig) -> (Self, InboundReceiver) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let engine = Self {
            protocol,
            config,
            status: AtomicEngineStatus::new(EngineStatus::Offline),
            acks: AckClock::new(),
            outbound_tx,
            outbound_rx: Mutex::new(outbound_rx),
            inbound_tx,
        };
        (engine, inbound_rx)
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        self.status.load()
    }

    /// Engine timing configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Time of the most recent heartbeat acknowledgement.
    #[must_use]
    pub fn last_acknowledged(&self) -> Option<Instant> {
        self.acks.last()
    }

    /// Enqueue an outbound envelope.
    ///
    /// Never blocks. Envelopes queued before a run starts are sent once it does,
    /// in submission order.
    pub fn submit_command(&self, payload: Payload) {
        // The receiver lives in `self`, so this cannot fail while `self` exists.
        let _ = self.outbound_tx.send(payload);
    }

    /// Handle for submitting commands from other tasks.
    #[must_use]
    pub fn command_sender(&self) -> CommandSender {
        CommandSender {
            tx: self.outbound_tx.clone(),
        }
    }

    /// Drive one connection until it ends.
    ///
    /// Returns [`EngineOutcome::Success`] when `cancel` fires,
    /// [`EngineOutcome::Recoverable`] on normal closure or a reconnect request,
    /// and [`EngineOutcome::Fatal`] on liveness, transport or policy failures.
    pub async fn run<T: Transport>(&self, transport: T, cancel: CancellationToken) -> EngineOutcome {
        let Ok(mut outbound) = self.outbound_rx.try_lock() else {
            warn!("run called while another run is active");
            return EngineOutcome::Fatal(EngineFault::AlreadyRunning);
        };

        if let Err(e) = self.config.validate() {
            return EngineOutcome::Fatal(EngineFault::Internal(e.to_string()));
        }

        self.status.store(EngineStatus::Connecting);
        info!(
            heartbeat_interval_ms = self.config.heartbeat_interval.as_millis() as u64,
            "gateway run started"
        );

        let (sink, source) = transport.split();
        let scope = cancel.child_token();

        let send = AssertUnwindSafe(self.send_loop(sink, &mut outbound)).catch_unwind();
        let receive = AssertUnwindSafe(self.receive_loop(source)).catch_unwind();

        let exit = tokio::select! {
            biased;
            () = scope.cancelled() => LoopExit::Cancelled,
            exit = send => exit.unwrap_or_else(|panic| LoopExit::panicked("send", panic.as_ref())),
            exit = receive => exit.unwrap_or_else(|panic| LoopExit::panicked("receive", panic.as_ref())),
        };
        scope.cancel();

        self.status.store(EngineStatus::Disconnecting);
        let outcome = resolve(exit, cancel.is_cancelled());
        match &outcome {
            EngineOutcome::Success => info!("gateway run finished by caller"),
            EngineOutcome::Recoverable(interruption) => info!(
                reason = %interruption.reason,
                resume = interruption.resume,
                "gateway run interrupted"
            ),
            EngineOutcome::Fatal(fault) => warn!(error = %fault, "gateway run failed"),
        }
        self.status.store(EngineStatus::Offline);
        outcome
    }

    async fn send_loop<S: PayloadSink>(
        &self,
        mut sink: S,
        outbound: &mut mpsc::UnboundedReceiver<Payload>,
    ) -> LoopExit {
        let mut governor = HeartbeatGovernor::new(self.config.heartbeat_interval, &self.acks);

        loop {
            let now = Instant::now();

            if governor.is_due(now) {
                if let Err(fault) = governor.check_acknowledged() {
                    warn!(
                        interval_ms = governor.interval().as_millis() as u64,
                        "heartbeat not acknowledged"
                    );
                    return LoopExit::Fault(fault);
                }
                if let Err(e) = sink.send(self.protocol.heartbeat()).await {
                    debug!(error = %e, "heartbeat send failed");
                    return LoopExit::Transport(e);
                }
                governor.record_sent(now);
                debug!("heartbeat sent");
                // A sink may complete without suspending; yield so cancellation
                // and the receive loop are polled between transmissions.
                yield_now().await;
                continue;
            }

            if let Ok(payload) = outbound.try_recv() {
                let op = payload.op();
                if let Err(e) = sink.send(payload).await {
                    debug!(%op, error = %e, "command send failed");
                    return LoopExit::Transport(e);
                }
                trace!(%op, "command sent");
                yield_now().await;
            } else {
                let wake = governor
                    .next_deadline(now)
                    .min(now + self.config.poll_quantum);
                sleep_until(wake).await;
            }
        }
    }

    async fn receive_loop<R: PayloadSource>(&self, mut source: R) -> LoopExit {
        loop {
            let payload = match source.receive().await {
                Ok(payload) => payload,
                Err(e) => {
                    debug!(error = %e, "receive failed");
                    return LoopExit::Transport(e);
                }
            };
            self.status
                .advance(EngineStatus::Connecting, EngineStatus::Connected);

            match self.protocol.recognize(&payload) {
                Control::HeartbeatAck => {
                    self.acks.record(Instant::now());
                    trace!("heartbeat acknowledged");
                    continue;
                }
                Control::Heartbeat => {
                    debug!("peer requested heartbeat acknowledgement");
                    self.submit_command(self.protocol.heartbeat_ack());
                    continue;
                }
                Control::Ready => info!("session ready"),
                Control::Other => {}
            }

            let op = payload.op();
            let action = self.protocol.classify(&payload);
            if self.inbound_tx.send(payload).is_err() {
                trace!(%op, "inbound buffer closed, envelope dropped");
            }

            if action.is_terminal() {
                info!(%op, ?action, "classification ended connection");
                return LoopExit::Action { action, op };
            }
        }
    }
}

impl std::fmt::Debug for GatewayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayEngine")
            .field("config", &self.config)
            .field("status", &self.status.load())
            .finish_non_exhaustive()
    }
}
