//! Error types for the gatelink-proto crate.

use thiserror::Error;

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode an envelope.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode an envelope.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Opcode outside the standard table.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(u8),

    /// Envelope carried a different message than the one requested.
    #[error("unexpected message: expected {expected}, got op {actual}")]
    UnexpectedMessage {
        /// Message that was requested.
        expected: &'static str,
        /// Opcode actually present on the envelope.
        actual: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_opcode_display() {
        let err = ProtoError::UnknownOpcode(42);
        assert_eq!(err.to_string(), "unknown opcode: 42");
    }

    #[test]
    fn test_unexpected_message_display() {
        let err = ProtoError::UnexpectedMessage {
            expected: "hello",
            actual: 0,
        };
        assert_eq!(
            err.to_string(),
            "unexpected message: expected hello, got op 0"
        );
    }

    #[test]
    fn test_decoding_display() {
        let err = ProtoError::Decoding("eof".to_string());
        assert_eq!(err.to_string(), "decoding error: eof");
    }
}
