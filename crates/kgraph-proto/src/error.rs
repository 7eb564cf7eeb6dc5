//! Error types for the kgraph-proto crate.

use thiserror::Error;

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a message.
    #[error("JSON marshal: {0}")]
    Encoding(String),

    /// Failed to decode a message.
    #[error("JSON unmarshal: {0}")]
    Decoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtoError::Decoding("expected value at line 1 column 1".into());
        assert_eq!(err.to_string(), "JSON unmarshal: expected value at line 1 column 1");

        let err = ProtoError::Encoding("key must be a string".into());
        assert!(err.to_string().starts_with("JSON marshal"));
    }
}
