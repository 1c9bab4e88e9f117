//! Synchronous RPC client for ZeroMQ remote API servers.
//!
//! A call sends `{"func": name, "args": [...]}` as CBOR over a ZeroMQ REQ
//! socket, blocks for the reply and interprets
//! `{"success": bool, "ret"?: value, "error"?: value}`.
//!
//! # Architecture
//!
//! - [`client`]: [`RpcClient`] and the thread-safe [`SharedClient`]
//! - [`protocol`]: request/response envelopes
//! - [`transport`]: the [`Transport`] trait and its ZeroMQ implementation
//! - [`object`]: remote object introspection (`zmqRemoteApi.info`)
//! - [`diagnostics`]: optional tracing of every message exchanged
//! - [`config`]: [`ClientConfig`] (host, port, verbosity, timeouts)
//! - [`error`]: [`Error`] and the `Result` alias
//!
//! # Example
//!
//! ```no_run
//! use zrapi_rpc::{ClientConfig, RpcClient, Value};
//!
//! # fn example() -> Result<(), zrapi_rpc::Error> {
//! let mut client = RpcClient::connect(&ClientConfig::default().with_verbose(true))?;
//!
//! let handle = client.call_unpacked("sim.getObject", vec![Value::from("/Floor")])?;
//! println!("Floor handle: {handle}");
//!
//! let sim = client.get_object("sim")?;
//! let alias = client.call_member(&sim, "getObjectAlias", vec![handle])?;
//! println!("Alias: {alias}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod object;
pub mod protocol;
pub mod transport;

#[cfg(test)]
mod tests;

// Re-export main client types
pub use client::{RpcClient, SharedClient};

// Re-export configuration
pub use config::{ClientConfig, DEFAULT_HOST, DEFAULT_PORT};

// Re-export error types
pub use error::{Error, Result};

// Re-export protocol types
pub use protocol::{Request, Response, UNKNOWN_REMOTE_ERROR, unpack_returns};

// Re-export transport types
pub use transport::{Transport, TransportError, ZmqTransport};

pub use object::{INFO_FUNCTION, RemoteObject};

// Re-export the value model
pub use zrapi_types::{CborCodec, Codec, DecodeError, EncodeError, Kind, Map, TypeMismatch, Value};
