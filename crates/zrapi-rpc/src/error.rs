//! Error types for the zrapi-rpc crate.
//!
//! Every failure of a call surfaces as one [`Error`]. Transport variants
//! (`Connect`, `Send`, `Receive`, `Timeout`) mean the exchange itself broke;
//! `Decode` and `Protocol` mean a reply arrived but was unusable; `Remote`
//! means the far end answered and rejected the call.

use std::time::Duration;

use zrapi_types::{DecodeError, EncodeError, TypeMismatch, Value};

use crate::transport::TransportError;

/// Unified error type for RPC operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Receive timed out after {0:?}")]
    Timeout(Duration),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    #[error("Remote error: {message}")]
    Remote {
        message: String,
        payload: Option<Value>,
    },

    #[error("Remote object {object} has no function {member}")]
    UnknownMember { object: String, member: String },

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// The far end reported `success: false`.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Connectivity failed before a reply could be read.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Send(_) | Self::Receive(_) | Self::Timeout(_)
        )
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Connect { endpoint, reason } => Self::Connect { endpoint, reason },
            TransportError::Send(reason) => Self::Send(reason),
            TransportError::Receive(reason) => Self::Receive(reason),
            TransportError::Timeout(after) => Self::Timeout(after),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use zrapi_types::Kind;

    #[test]
    fn test_error_from_transport_error() {
        let err: Error = TransportError::Connect {
            endpoint: "tcp://localhost:23000".to_string(),
            reason: "connection refused".to_string(),
        }
        .into();

        match &err {
            Error::Connect { endpoint, reason } => {
                assert_eq!(endpoint, "tcp://localhost:23000");
                assert_eq!(reason, "connection refused");
            }
            _ => panic!("Expected Connect error"),
        }
        assert!(err.is_transport());

        let err: Error = TransportError::Send("would block".to_string()).into();
        assert!(matches!(err, Error::Send(_)));

        let err: Error = TransportError::Receive("closed".to_string()).into();
        assert!(matches!(err, Error::Receive(_)));

        let err: Error = TransportError::Timeout(Duration::from_secs(1)).into();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_error_from_decode_error() {
        let err: Error = DecodeError::Truncated.into();
        assert!(matches!(err, Error::Decode(DecodeError::Truncated)));
        assert!(!err.is_transport());
        assert!(!err.is_remote());
    }

    #[test]
    fn test_error_from_type_mismatch() {
        let err: Error = TypeMismatch {
            expected: Kind::Integer,
            found: Kind::Text,
        }
        .into();

        assert!(matches!(err, Error::TypeMismatch(_)));
        assert_eq!(err.to_string(), "type mismatch: expected integer, found text");
    }

    #[test]
    fn test_error_display() {
        let err = Error::Remote {
            message: "boom".to_string(),
            payload: Some(Value::from("boom")),
        };
        assert_eq!(err.to_string(), "Remote error: boom");
        assert!(err.is_remote());

        let err = Error::protocol("reply has no `success` field");
        assert_eq!(err.to_string(), "Protocol error: reply has no `success` field");

        let err = Error::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Receive timed out after 1.5s");

        let err = Error::UnknownMember {
            object: "sim".to_string(),
            member: "fly".to_string(),
        };
        assert_eq!(err.to_string(), "Remote object sim has no function fly");
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::Send("would block".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Send"));
        assert!(debug_str.contains("would block"));
    }
}
