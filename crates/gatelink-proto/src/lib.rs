//! # gatelink-proto
//!
//! Envelope model for the gatelink gateway protocol: the generic [`Payload`]
//! wrapper, the standard [`Opcode`] table, the closed set of [`Control`]
//! messages the connection engine intercepts, and the typed inner messages
//! exchanged during the handshake.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod control;
pub mod error;
pub mod messages;
pub mod opcode;
pub mod payload;

pub use control::Control;
pub use error::ProtoError;
pub use messages::{ConnectionProperties, Hello, Identify, InvalidSession, Ready, Resume};
pub use opcode::Opcode;
pub use payload::Payload;
