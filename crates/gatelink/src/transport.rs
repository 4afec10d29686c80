//! The duplex transport contract consumed by the engine.
//!
//! A transport is split into a sending half and a receiving half so the send
//! and receive loops can each own one. Both operations must be cancel-safe to
//! the extent that dropping an in-flight future abandons the operation.

use std::future::Future;
use std::pin::Pin;

use gatelink_proto::Payload;

use crate::error::TransportError;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Sending half of a transport.
pub trait PayloadSink: Send {
    /// Transmit one envelope.
    fn send(&mut self, payload: Payload) -> TransportFuture<'_, ()>;
}

/// Receiving half of a transport.
pub trait PayloadSource: Send {
    /// Wait for the next envelope.
    fn receive(&mut self) -> TransportFuture<'_, Payload>;
}

/// A duplex transport that can be split into its two halves.
pub trait Transport {
    /// Sending half.
    type Sink: PayloadSink;
    /// Receiving half.
    type Source: PayloadSource;

    /// Split into independently owned halves.
    fn split(self) -> (Self::Sink, Self::Source);
}

impl<S: PayloadSink, R: PayloadSource> Transport for (S, R) {
    type Sink = S;
    type Source = R;

    fn split(self) -> (S, R) {
        self
    }
}

impl<T: PayloadSink + ?Sized> PayloadSink for Box<T> {
    fn send(&mut self, payload: Payload) -> TransportFuture<'_, ()> {
        (**self).send(payload)
    }
}

impl<T: PayloadSource + ?Sized> PayloadSource for Box<T> {
    fn receive(&mut self) -> TransportFuture<'_, Payload> {
        (**self).receive()
    }
}
