//! Request and response envelopes.
//!
//! ```text
//! request:  {"func": text, "args": [value, ...]}
//! response: {"success": bool, "ret"?: value, "error"?: value}
//! ```
//!
//! Envelopes live for one call: a [`Request`] is consumed into the value
//! that gets encoded, a [`Response`] is consumed into the call's result.

use std::borrow::Cow;

use zrapi_types::{Map, Value};

use crate::error::{Error, Result};

pub const FUNC_KEY: &str = "func";
pub const ARGS_KEY: &str = "args";
pub const SUCCESS_KEY: &str = "success";
pub const RET_KEY: &str = "ret";
pub const ERROR_KEY: &str = "error";

/// Message of a remote error that came without an `error` field.
pub const UNKNOWN_REMOTE_ERROR: &str = "unknown remote error";

/// Outgoing call envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub func: String,
    pub args: Vec<Value>,
}

impl Request {
    #[must_use]
    pub fn new(func: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            func: func.into(),
            args,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        let mut envelope = Map::new();
        envelope.insert(FUNC_KEY.to_string(), Value::Text(self.func));
        envelope.insert(ARGS_KEY.to_string(), Value::Array(self.args));
        Value::Object(envelope)
    }
}

/// Interpreted reply envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// `success: true`; holds `ret`, or `Null` when the call returned nothing
    Success(Value),
    /// `success: false`; holds `error` when the far end supplied one
    Failure(Option<Value>),
}

impl Response {
    #[must_use]
    pub fn success(ret: impl Into<Value>) -> Self {
        Self::Success(ret.into())
    }

    #[must_use]
    pub fn failure(error: Option<Value>) -> Self {
        Self::Failure(error)
    }

    /// Interpret a decoded reply.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` when the reply is not an object, has no
    /// `success` field, or `success` is not a bool.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut envelope = match value {
            Value::Object(envelope) => envelope,
            other => {
                return Err(Error::protocol(format!(
                    "reply is {} instead of an object",
                    other.kind()
                )));
            }
        };

        match envelope.remove(SUCCESS_KEY) {
            Some(Value::Bool(true)) => Ok(Self::Success(
                envelope.remove(RET_KEY).unwrap_or(Value::Null),
            )),
            Some(Value::Bool(false)) => Ok(Self::Failure(envelope.remove(ERROR_KEY))),
            Some(other) => Err(Error::protocol(format!(
                "`{SUCCESS_KEY}` is {} instead of a bool",
                other.kind()
            ))),
            None => Err(Error::protocol(format!("reply has no `{SUCCESS_KEY}` field"))),
        }
    }

    /// Encode back into the wire shape. Used by servers and tests.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut envelope = Map::new();
        match self {
            Self::Success(ret) => {
                envelope.insert(SUCCESS_KEY.to_string(), Value::Bool(true));
                envelope.insert(RET_KEY.to_string(), ret);
            }
            Self::Failure(error) => {
                envelope.insert(SUCCESS_KEY.to_string(), Value::Bool(false));
                if let Some(error) = error {
                    envelope.insert(ERROR_KEY.to_string(), error);
                }
            }
        }
        Value::Object(envelope)
    }

    /// # Errors
    ///
    /// Returns `Error::Remote` for a failure envelope.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Success(ret) => Ok(ret),
            Self::Failure(payload) => Err(remote_error(payload)),
        }
    }
}

/// Build the error for a `success: false` reply.
///
/// Text and byte-string payloads become the message directly; any other
/// payload is rendered in diagnostic notation.
#[must_use]
pub fn remote_error(payload: Option<Value>) -> Error {
    let message = match &payload {
        None => UNKNOWN_REMOTE_ERROR.to_string(),
        Some(value) => value
            .text_lossy()
            .map_or_else(|_| value.to_string(), Cow::into_owned),
    };

    Error::Remote { message, payload }
}

/// Collapse the remote's multi-return convention.
///
/// Remote functions reply with an array of return values: no values becomes
/// `Null`, a single value is returned bare, several stay an array.
#[must_use]
pub fn unpack_returns(ret: Value) -> Value {
    match ret {
        Value::Array(mut items) if items.len() <= 1 => items.pop().unwrap_or(Value::Null),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_shape() {
        let value = Request::new("f", vec![Value::from(1), Value::from("x")]).into_value();

        let envelope = value.as_object().unwrap();
        assert_eq!(envelope.len(), 2);
        assert_eq!(value.get("func"), Some(&Value::from("f")));
        assert_eq!(
            value.get("args"),
            Some(&Value::array([Value::from(1), Value::from("x")]))
        );
    }

    #[test]
    fn test_request_without_args_has_empty_array() {
        let value = Request::new("sim.getSimulationTime", Vec::new()).into_value();
        assert_eq!(value.get("args"), Some(&Value::Array(Vec::new())));
    }

    #[test]
    fn test_parse_success_with_ret() {
        let reply = Value::object([("success", Value::Bool(true)), ("ret", Value::from(42))]);
        assert_eq!(
            Response::from_value(reply).unwrap(),
            Response::Success(Value::Integer(42))
        );
    }

    #[test]
    fn test_parse_success_without_ret() {
        let reply = Value::object([("success", true)]);
        assert_eq!(
            Response::from_value(reply).unwrap(),
            Response::Success(Value::Null)
        );
    }

    #[test]
    fn test_parse_failure_with_error() {
        let reply = Value::object([("success", Value::Bool(false)), ("error", Value::from("boom"))]);
        let response = Response::from_value(reply).unwrap();
        assert_eq!(response, Response::Failure(Some(Value::from("boom"))));

        match response.into_result() {
            Err(Error::Remote { message, payload }) => {
                assert_eq!(message, "boom");
                assert_eq!(payload, Some(Value::from("boom")));
            }
            other => panic!("Expected Remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_failure_without_error() {
        let reply = Value::object([("success", false)]);
        match Response::from_value(reply).unwrap().into_result() {
            Err(Error::Remote { message, payload }) => {
                assert_eq!(message, UNKNOWN_REMOTE_ERROR);
                assert!(payload.is_none());
            }
            other => panic!("Expected Remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_ignores_ret() {
        let reply = Value::object([
            ("success", Value::Bool(false)),
            ("ret", Value::from(1)),
        ]);
        assert_eq!(
            Response::from_value(reply).unwrap(),
            Response::Failure(None)
        );
    }

    #[test]
    fn test_missing_success_is_protocol_error() {
        let reply = Value::object([("ret", 42)]);
        let err = Response::from_value(reply).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(err.to_string().contains("success"));
    }

    #[test]
    fn test_non_bool_success_is_protocol_error() {
        for success in [Value::from(1), Value::from("true"), Value::Null] {
            let reply = Value::object([("success", success)]);
            assert!(matches!(
                Response::from_value(reply),
                Err(Error::Protocol(_))
            ));
        }
    }

    #[test]
    fn test_non_object_reply_is_protocol_error() {
        let err = Response::from_value(Value::array([true])).unwrap_err();
        assert_eq!(err.to_string(), "Protocol error: reply is array instead of an object");
    }

    #[test]
    fn test_remote_error_from_bytes_payload() {
        let err = remote_error(Some(Value::bytes(b"Object does not exist.".to_vec())));
        match err {
            Error::Remote { message, payload } => {
                assert_eq!(message, "Object does not exist.");
                assert!(matches!(payload, Some(Value::Bytes(_))));
            }
            _ => panic!("Expected Remote error"),
        }
    }

    #[test]
    fn test_remote_error_from_structured_payload() {
        let err = remote_error(Some(Value::object([("code", 3)])));
        assert_eq!(err.to_string(), r#"Remote error: {"code": 3}"#);
    }

    #[test]
    fn test_response_into_value_roundtrip() {
        for response in [
            Response::success(Value::array([1, 2])),
            Response::failure(Some(Value::from("nope"))),
            Response::failure(None),
        ] {
            let value = response.clone().into_value();
            assert_eq!(Response::from_value(value).unwrap(), response);
        }
    }

    #[test]
    fn test_unpack_returns() {
        assert_eq!(unpack_returns(Value::Array(Vec::new())), Value::Null);
        assert_eq!(unpack_returns(Value::array([7])), Value::Integer(7));
        assert_eq!(unpack_returns(Value::array([1, 2])), Value::array([1, 2]));
        assert_eq!(unpack_returns(Value::from("bare")), Value::from("bare"));
    }
}
