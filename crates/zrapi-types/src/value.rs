//! Dynamically typed values exchanged with the remote API.
//!
//! [`Value`] is the single data model used for request arguments, return
//! values and error payloads. Every accessor is tag-checked: reading a value
//! as the wrong variant yields a [`TypeMismatch`] instead of a silent
//! conversion. The two deliberate exceptions are documented on
//! [`Value::as_float`] and [`Value::text_lossy`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Key/value mapping held by [`Value::Object`].
///
/// A `BTreeMap` keeps keys unique and iteration order stable, so the same
/// object always encodes to the same bytes.
pub type Map = BTreeMap<String, Value>;

/// Discriminator of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Integer,
    Float,
    Text,
    Bytes,
    Array,
    Object,
}

impl Kind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::Text => "text",
            Kind::Bytes => "bytes",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value was read as a variant it does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("type mismatch: expected {expected}, found {found}")]
pub struct TypeMismatch {
    pub expected: Kind,
    pub found: Kind,
}

/// Generic, dynamically typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Raw octets. Never interchangeable with [`Value::Text`].
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    /// Build a byte-string value.
    #[must_use]
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    /// Build an array from anything convertible into values.
    #[must_use]
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build an object from key/value pairs. Later duplicates win.
    #[must_use]
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::Text(_) => Kind::Text,
            Value::Bytes(_) => Kind::Bytes,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn mismatch(&self, expected: Kind) -> TypeMismatch {
        TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    /// # Errors
    ///
    /// Returns [`TypeMismatch`] unless the value is a `Bool`.
    pub fn as_bool(&self) -> Result<bool, TypeMismatch> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch(Kind::Bool)),
        }
    }

    /// # Errors
    ///
    /// Returns [`TypeMismatch`] unless the value is an `Integer`. Floats are
    /// never truncated to integers.
    pub fn as_integer(&self) -> Result<i64, TypeMismatch> {
        match self {
            Value::Integer(i) => Ok(*i),
            other => Err(other.mismatch(Kind::Integer)),
        }
    }

    /// Read a float, widening integers.
    ///
    /// Remote endpoints written in dynamically typed languages freely send
    /// `2` where `2.0` is meant, so `Integer` is accepted here and converted
    /// to the nearest `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatch`] unless the value is a `Float` or an `Integer`.
    // Widening is documented above; magnitudes past 2^53 round to nearest.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Result<f64, TypeMismatch> {
        match self {
            Value::Float(x) => Ok(*x),
            Value::Integer(i) => Ok(*i as f64),
            other => Err(other.mismatch(Kind::Float)),
        }
    }

    /// # Errors
    ///
    /// Returns [`TypeMismatch`] unless the value is `Text`.
    pub fn as_text(&self) -> Result<&str, TypeMismatch> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(other.mismatch(Kind::Text)),
        }
    }

    /// # Errors
    ///
    /// Returns [`TypeMismatch`] unless the value is `Bytes`.
    pub fn as_bytes(&self) -> Result<&[u8], TypeMismatch> {
        match self {
            Value::Bytes(b) => Ok(b),
            other => Err(other.mismatch(Kind::Bytes)),
        }
    }

    /// # Errors
    ///
    /// Returns [`TypeMismatch`] unless the value is an `Array`.
    pub fn as_array(&self) -> Result<&[Value], TypeMismatch> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch(Kind::Array)),
        }
    }

    /// # Errors
    ///
    /// Returns [`TypeMismatch`] unless the value is an `Object`.
    pub fn as_object(&self) -> Result<&Map, TypeMismatch> {
        match self {
            Value::Object(map) => Ok(map),
            other => Err(other.mismatch(Kind::Object)),
        }
    }

    /// # Errors
    ///
    /// Returns [`TypeMismatch`] unless the value is an `Array`.
    pub fn into_array(self) -> Result<Vec<Value>, TypeMismatch> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch(Kind::Array)),
        }
    }

    /// # Errors
    ///
    /// Returns [`TypeMismatch`] unless the value is an `Object`.
    pub fn into_object(self) -> Result<Map, TypeMismatch> {
        match self {
            Value::Object(map) => Ok(map),
            other => Err(other.mismatch(Kind::Object)),
        }
    }

    /// Extract a string from either a text or a byte-string value.
    ///
    /// The remote end commonly ships strings as CBOR byte strings (sometimes
    /// wrapped in the "expected base64" tags, which the codec strips). Those
    /// bytes are the string's UTF-8 encoding; invalid sequences are replaced
    /// with U+FFFD.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatch`] for every kind other than `Text` and `Bytes`.
    pub fn text_lossy(&self) -> Result<Cow<'_, str>, TypeMismatch> {
        match self {
            Value::Text(s) => Ok(Cow::Borrowed(s)),
            Value::Bytes(b) => Ok(String::from_utf8_lossy(b)),
            other => Err(other.mismatch(Kind::Text)),
        }
    }

    /// Look up `key` in an object. `None` for missing keys and non-objects.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Element `index` of an array. `None` when out of range or not an array.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Number of elements of an array or entries of an object.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatch`] (expecting `Array`) for scalar values.
    pub fn len(&self) -> Result<usize, TypeMismatch> {
        match self {
            Value::Array(items) => Ok(items.len()),
            Value::Object(map) => Ok(map.len()),
            other => Err(other.mismatch(Kind::Array)),
        }
    }

    /// # Errors
    ///
    /// Same as [`Value::len`].
    pub fn is_empty(&self) -> Result<bool, TypeMismatch> {
        self.len().map(|len| len == 0)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().collect())
    }
}
