//! WebSocket transport built on tokio-tungstenite.
//!
//! Envelopes travel as JSON text frames; binary frames are decoded the same
//! way. Control frames (ping, pong) are handled by tungstenite and never reach
//! the engine. A close frame with code 1000 or 1001 surfaces as
//! [`TransportError::NormalClosure`]; any other close, or a stream that ends
//! without a close frame, surfaces as [`TransportError::Closed`].

use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use gatelink_proto::Payload;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::error::TransportError;
use crate::transport::{PayloadSink, PayloadSource, Transport, TransportFuture};

/// WebSocket transport over the stream `S`.
pub struct WsTransport<S> {
    stream: WebSocketStream<S>,
}

/// Transport returned by [`WsTransport::connect`].
pub type WsClientTransport = WsTransport<MaybeTlsStream<TcpStream>>;

impl WsTransport<MaybeTlsStream<TcpStream>> {
    /// Open a client connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] if the handshake takes longer than
    /// `timeout`, or [`TransportError::Network`] if it fails.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, TransportError> {
        debug!(url, "connecting to gateway");
        let (stream, _response) = tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { stream })
    }
}

impl<S> WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap an already-established WebSocket stream.
    #[must_use]
    pub const fn from_stream(stream: WebSocketStream<S>) -> Self {
        Self { stream }
    }
}

impl<S> Transport for WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Sink = WsSink<S>;
    type Source = WsSource<S>;

    fn split(self) -> (WsSink<S>, WsSource<S>) {
        let (write, read) = self.stream.split();
        (WsSink { write }, WsSource { read })
    }
}

/// Sending half of a [`WsTransport`].
pub struct WsSink<S> {
    write: SplitSink<WebSocketStream<S>, Message>,
}

impl<S> PayloadSink for WsSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn send(&mut self, payload: Payload) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let json = payload.to_json()?;
            self.write
                .send(Message::Text(json.into()))
                .await
                .map_err(map_ws_error)
        })
    }
}

/// Receiving half of a [`WsTransport`].
pub struct WsSource<S> {
    read: SplitStream<WebSocketStream<S>>,
}

impl<S> PayloadSource for WsSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn receive(&mut self) -> TransportFuture<'_, Payload> {
        Box::pin(async move {
            loop {
                match self.read.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(Payload::from_json(&text)?),
                    Some(Ok(Message::Binary(bytes))) => return Ok(Payload::from_slice(&bytes)?),
                    Some(Ok(Message::Close(frame))) => return Err(close_error(frame)),
                    Some(Ok(other)) => trace!(?other, "skipping control frame"),
                    Some(Err(e)) => return Err(map_ws_error(e)),
                    None => {
                        return Err(TransportError::Closed {
                            code: None,
                            reason: "stream ended without close frame".to_string(),
                        });
                    }
                }
            }
        })
    }
}

fn close_error(frame: Option<CloseFrame>) -> TransportError {
    let Some(frame) = frame else {
        return TransportError::Closed {
            code: None,
            reason: "close frame without status".to_string(),
        };
    };
    match frame.code {
        CloseCode::Normal | CloseCode::Away => TransportError::NormalClosure,
        code => TransportError::Closed {
            code: Some(u16::from(code)),
            reason: frame.reason.to_string(),
        },
    }
}

fn map_ws_error(error: tungstenite::Error) -> TransportError {
    match error {
        tungstenite::Error::ConnectionClosed => TransportError::NormalClosure,
        tungstenite::Error::AlreadyClosed => TransportError::Closed {
            code: None,
            reason: "connection already closed".to_string(),
        },
        other => TransportError::Network(other.to_string()),
    }
}
