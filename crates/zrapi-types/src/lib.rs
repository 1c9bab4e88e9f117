//! Value model and wire codec for the zrapi remote API client.
//!
//! - [`Value`]: closed, dynamically typed data model (null, bool, integer,
//!   float, text, bytes, array, object) with tag-checked accessors
//! - [`Codec`]: encode/decode contract, implemented by [`CborCodec`]
//!
//! Values print in CBOR diagnostic notation via `Display`.
//!
//! # Example
//!
//! ```
//! use zrapi_types::{CborCodec, Codec, Value};
//!
//! let codec = CborCodec::new();
//! let value = Value::array([Value::from(1), Value::from("x")]);
//!
//! let bytes = codec.encode(&value).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), value);
//! ```

pub mod codec;
mod display;
pub mod value;

pub use codec::{CborCodec, Codec, DecodeError, EncodeError};
pub use value::{Kind, Map, TypeMismatch, Value};
