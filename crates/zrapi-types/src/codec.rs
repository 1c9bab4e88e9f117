//! Binary wire codec for [`Value`].
//!
//! The remote API speaks CBOR (RFC 8949). Encoding and decoding go through
//! `ciborium`'s own value tree, which is then mapped onto [`Value`] with the
//! stricter rules of this crate:
//!
//! - byte strings and text strings keep their tags in both directions
//! - semantic tags are transparent (the tagged item is used as-is)
//! - integers must fit in `i64`
//! - map keys must be unique text strings
//! - a message is exactly one item; trailing bytes are rejected

use std::io;

use ciborium::Value as CborValue;

use crate::value::{Map, Value};

/// Converts values to and from their wire representation.
///
/// Implementations must satisfy `decode(&encode(v)?)? == v` for every
/// value they can encode, and must fail (never panic) on malformed input.
pub trait Codec {
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the value cannot be represented.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError>;

    /// # Errors
    ///
    /// Returns [`DecodeError`] describing why `bytes` is not a valid message.
    fn decode(&self, bytes: &[u8]) -> Result<Value, DecodeError>;
}

/// CBOR codec
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl CborCodec {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Codec for CborCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        ciborium::into_writer(&to_cbor(value), &mut out)
            .map_err(|e| EncodeError(e.to_string()))?;
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut reader = bytes;
        let raw: CborValue = ciborium::from_reader(&mut reader).map_err(DecodeError::from_cbor)?;

        if !reader.is_empty() {
            return Err(DecodeError::TrailingBytes {
                offset: bytes.len() - reader.len(),
            });
        }

        from_cbor(raw)
    }
}

fn to_cbor(value: &Value) -> CborValue {
    match value {
        Value::Null => CborValue::Null,
        Value::Bool(b) => CborValue::Bool(*b),
        Value::Integer(i) => CborValue::Integer((*i).into()),
        Value::Float(x) => CborValue::Float(*x),
        Value::Text(s) => CborValue::Text(s.clone()),
        Value::Bytes(b) => CborValue::Bytes(b.clone()),
        Value::Array(items) => CborValue::Array(items.iter().map(to_cbor).collect()),
        Value::Object(map) => CborValue::Map(
            map.iter()
                .map(|(key, item)| (CborValue::Text(key.clone()), to_cbor(item)))
                .collect(),
        ),
    }
}

fn from_cbor(raw: CborValue) -> Result<Value, DecodeError> {
    let value = match raw {
        CborValue::Null => Value::Null,
        CborValue::Bool(b) => Value::Bool(b),
        CborValue::Integer(i) => {
            let wide = i128::from(i);
            let narrow = i64::try_from(wide).map_err(|_| DecodeError::IntegerOutOfRange(wide))?;
            Value::Integer(narrow)
        }
        CborValue::Float(x) => Value::Float(x),
        CborValue::Text(s) => Value::Text(s),
        CborValue::Bytes(b) => Value::Bytes(b),
        CborValue::Tag(_, inner) => from_cbor(*inner)?,
        CborValue::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_cbor)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        CborValue::Map(entries) => {
            let mut map = Map::new();
            for (key, item) in entries {
                let key = text_key(key)?;
                if map.contains_key(&key) {
                    return Err(DecodeError::DuplicateKey(key));
                }
                let item = from_cbor(item)?;
                map.insert(key, item);
            }
            Value::Object(map)
        }
        other => return Err(DecodeError::Unsupported(format!("{other:?}"))),
    };

    Ok(value)
}

fn text_key(mut key: CborValue) -> Result<String, DecodeError> {
    while let CborValue::Tag(_, inner) = key {
        key = *inner;
    }

    match key {
        CborValue::Text(s) => Ok(s),
        other => Err(DecodeError::NonTextKey(format!("{other:?}"))),
    }
}

/// A value could not be encoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("CBOR encode error: {0}")]
pub struct EncodeError(pub String);

/// Reply bytes could not be turned into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty message")]
    Empty,

    #[error("truncated message")]
    Truncated,

    #[error("malformed CBOR at byte {offset}")]
    Syntax { offset: usize },

    #[error("invalid CBOR item: {message}")]
    Semantic {
        offset: Option<usize>,
        message: String,
    },

    #[error("nesting too deep")]
    RecursionLimit,

    #[error("trailing bytes after item at byte {offset}")]
    TrailingBytes { offset: usize },

    #[error("integer {0} does not fit in 64 bits")]
    IntegerOutOfRange(i128),

    #[error("map key is not text: {0}")]
    NonTextKey(String),

    #[error("duplicate map key: {0:?}")]
    DuplicateKey(String),

    #[error("unsupported CBOR item: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DecodeError {
    fn from_cbor(err: ciborium::de::Error<io::Error>) -> Self {
        use ciborium::de::Error;

        match err {
            Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => DecodeError::Truncated,
            Error::Io(e) => DecodeError::Io(e.to_string()),
            Error::Syntax(offset) => DecodeError::Syntax { offset },
            Error::Semantic(offset, message) => DecodeError::Semantic { offset, message },
            Error::RecursionLimitExceeded => DecodeError::RecursionLimit,
        }
    }
}
