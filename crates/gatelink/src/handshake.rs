//! Connection opening: waiting for the peer's hello and choosing the first
//! command.

use std::time::Duration;

use gatelink_proto::{Hello, Opcode, Payload, ProtoError};
use tracing::debug;

use crate::error::TransportError;
use crate::protocol::{Protocol, StandardProtocol};
use crate::session::ResumeTicket;
use crate::transport::PayloadSource;

/// Wait for the peer's hello on a fresh connection.
///
/// # Errors
///
/// Returns [`TransportError::Timeout`] if no envelope arrives within
/// `timeout`, [`TransportError::Protocol`] if the first envelope is not a
/// hello or announces a zero interval, and any error from the source itself.
pub async fn await_hello<R>(source: &mut R, timeout: Duration) -> Result<Hello, TransportError>
where
    R: PayloadSource + ?Sized,
{
    let payload = tokio::time::timeout(timeout, source.receive())
        .await
        .map_err(|_| TransportError::Timeout(timeout))??;

    if payload.op() != Opcode::Hello {
        return Err(TransportError::Protocol(format!(
            "expected hello, got {}",
            payload.op()
        )));
    }

    let hello = Hello::from_payload(&payload)?;
    if hello.interval().is_zero() {
        return Err(TransportError::Protocol(
            "hello announced a zero heartbeat interval".to_string(),
        ));
    }

    debug!(interval_ms = hello.heartbeat_interval, "received hello");
    Ok(hello)
}

/// First command for a connection: resume when a ticket is available,
/// identify otherwise.
///
/// # Errors
///
/// Returns an error if the command cannot be encoded.
pub fn opening_command(
    protocol: &StandardProtocol,
    ticket: Option<&ResumeTicket>,
) -> Result<Payload, ProtoError> {
    match ticket {
        Some(ticket) => protocol.resume_request(ticket),
        None => protocol.identify(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::transport::TransportFuture;

    struct Scripted(Vec<Result<Payload, TransportError>>);

    impl PayloadSource for Scripted {
        fn receive(&mut self) -> TransportFuture<'_, Payload> {
            let next = self.0.pop();
            Box::pin(async move {
                match next {
                    Some(result) => result,
                    None => std::future::pending().await,
                }
            })
        }
    }

    #[tokio::test]
    async fn test_hello_accepted() {
        let mut source = Scripted(vec![Ok(Payload::new(
            Opcode::Hello,
            json!({"heartbeat_interval": 41250}),
        ))]);
        let hello = await_hello(&mut source, Duration::from_secs(1))
            .await
            .expect("hello");
        assert_eq!(hello.interval(), Duration::from_millis(41250));
    }

    #[tokio::test]
    async fn test_wrong_first_envelope_rejected() {
        let mut source = Scripted(vec![Ok(Payload::new(Opcode::HeartbeatAck, json!(null)))]);
        let err = await_hello(&mut source, Duration::from_secs(1))
            .await
            .expect_err("not a hello");
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let mut source = Scripted(vec![Ok(Payload::new(
            Opcode::Hello,
            json!({"heartbeat_interval": 0}),
        ))]);
        let err = await_hello(&mut source, Duration::from_secs(1))
            .await
            .expect_err("zero interval");
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hello_timeout() {
        let mut source = Scripted(Vec::new());
        let err = await_hello(&mut source, Duration::from_secs(5))
            .await
            .expect_err("timeout");
        assert!(matches!(err, TransportError::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let mut source = Scripted(vec![Err(TransportError::NormalClosure)]);
        let err = await_hello(&mut source, Duration::from_secs(1))
            .await
            .expect_err("closed");
        assert!(err.is_normal_closure());
    }

    #[test]
    fn test_opening_command_selection() {
        let protocol = StandardProtocol::new("secret", 513);
        assert_eq!(
            opening_command(&protocol, None).expect("identify").op(),
            Opcode::Identify
        );

        let ticket = ResumeTicket {
            session_id: "abc".to_string(),
            sequence: 42,
        };
        assert_eq!(
            opening_command(&protocol, Some(&ticket)).expect("resume").op(),
            Opcode::Resume
        );
    }
}
