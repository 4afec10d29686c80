//! # gatelink
//!
//! Client-side engine for persistent gateway connections.
//!
//! A [`GatewayEngine`] drives one connection over any duplex [`Transport`]:
//! it keeps the peer alive with heartbeats, sends queued commands in order,
//! answers control messages, buffers everything else for the application and
//! asks a [`Protocol`] policy whether each envelope should end the connection.
//! Every run ends with an [`EngineOutcome`] the caller uses to decide whether
//! to reconnect, resume or give up.
//!
//! The `gatelink` binary wires the engine to a WebSocket transport
//! ([`ws::WsTransport`]) with configuration from TOML and exponential
//! reconnection backoff.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod handshake;
pub mod heartbeat;
pub mod outcome;
pub mod protocol;
pub mod reconnect;
pub mod session;
pub mod status;
pub mod transport;
pub mod ws;

pub use action::PayloadAction;
pub use config::{EngineConfig, GatelinkConfig};
pub use engine::{CommandSender, GatewayEngine, InboundReceiver};
pub use error::{EngineFault, GatelinkError, TransportError};
pub use outcome::{EngineOutcome, Interruption};
pub use protocol::{Protocol, StandardProtocol};
pub use reconnect::{ReconnectConfig, RecoveryPlan};
pub use session::{ResumeState, ResumeTicket};
pub use status::EngineStatus;
pub use transport::{PayloadSink, PayloadSource, Transport, TransportFuture};
