//! Envelope decoding tests against captured peer traffic.

use gatelink_proto::{Control, Hello, InvalidSession, Opcode, Payload, ProtoError, Ready};
use proptest::prelude::*;

const HELLO_FRAME: &str = r#"{"t":null,"s":null,"op":10,"d":{"heartbeat_interval":41250,"_trace":["gateway-prd-1"]}}"#;
const READY_FRAME: &str = r#"{"t":"READY","s":1,"op":0,"d":{"v":10,"session_id":"9f1c","resume_gateway_url":"wss://resume.example.com","user":{"id":"1"}}}"#;
const ACK_FRAME: &str = r#"{"t":null,"s":null,"op":11,"d":null}"#;
const INVALID_FRAME: &str = r#"{"t":null,"s":null,"op":9,"d":false}"#;

#[test]
fn test_handshake_sequence() {
    let hello = Payload::from_json(HELLO_FRAME).expect("hello frame");
    assert_eq!(hello.control(), Control::Other);
    assert_eq!(
        Hello::from_payload(&hello).expect("hello").heartbeat_interval,
        41250
    );

    let ready = Payload::from_json(READY_FRAME).expect("ready frame");
    assert_eq!(ready.control(), Control::Ready);
    assert_eq!(ready.sequence(), Some(1));
    let ready = Ready::from_payload(&ready).expect("ready");
    assert_eq!(ready.session_id, "9f1c");
}

#[test]
fn test_ack_is_intercepted() {
    let ack = Payload::from_json(ACK_FRAME).expect("ack frame");
    assert!(ack.control().is_intercepted());
}

#[test]
fn test_invalid_session_not_resumable() {
    let payload = Payload::from_json(INVALID_FRAME).expect("invalid frame");
    assert_eq!(payload.op(), Opcode::InvalidSession);
    assert!(!InvalidSession::from_payload(&payload).expect("op 9").resumable);
}

proptest! {
    #[test]
    fn prop_opcode_decoding_never_panics(code in any::<u8>()) {
        let json = format!(r#"{{"op":{code},"d":null}}"#);
        match Payload::from_json(&json) {
            Ok(payload) => prop_assert_eq!(payload.op().code(), code),
            Err(err) => prop_assert!(matches!(err, ProtoError::Decoding(_))),
        }
    }

    #[test]
    fn prop_dispatch_keeps_sequence(seq in any::<u64>(), event in "[A-Z_]{1,24}") {
        let payload = Payload::dispatch(event.clone(), seq, serde_json::json!({}));
        let decoded = Payload::from_json(&payload.to_json().expect("encode")).expect("decode");
        prop_assert_eq!(decoded.sequence(), Some(seq));
        prop_assert_eq!(decoded.event(), Some(event.as_str()));
    }
}
