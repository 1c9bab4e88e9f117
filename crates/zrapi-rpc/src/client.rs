//! Synchronous RPC client.
//!
//! [`RpcClient::call`] performs exactly one request/reply exchange: build
//! the envelope, encode, send, block for the reply, decode, interpret.
//! Nothing is retried. `call` takes `&mut self`, so an instance is used by
//! one thread at a time; [`SharedClient`] wraps an instance in a mutex for
//! callers that need to share one connection.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use zrapi_types::{CborCodec, Codec, Value};

use crate::config::ClientConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::protocol::{Request, Response, unpack_returns};
use crate::transport::{Transport, ZmqTransport};

/// Where the client stands in the send/receive alternation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rendezvous {
    Idle,
    /// A request went out but its reply was never read
    AwaitingReply,
}

/// RPC client owning one transport connection.
///
/// Calls block the calling thread. From async code, run them inside
/// `spawn_blocking`; calling directly from a task works but stalls its
/// worker thread until the reply arrives.
pub struct RpcClient<T: Transport = ZmqTransport, C: Codec = CborCodec> {
    transport: T,
    codec: C,
    diagnostics: Diagnostics,
    rendezvous: Rendezvous,
}

impl RpcClient {
    /// Connect to the server described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid config and `Error::Connect` if
    /// the server cannot be reached.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ZmqTransport::connect(config)?;
        Ok(Self::with_transport(
            transport,
            CborCodec::new(),
            config.verbose,
        ))
    }

    /// Connect to `tcp://localhost:23000`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connect` if the server cannot be reached.
    pub fn connect_default() -> Result<Self> {
        Self::connect(&ClientConfig::default())
    }
}

impl<T: Transport, C: Codec> RpcClient<T, C> {
    #[must_use]
    pub fn with_transport(transport: T, codec: C, verbose: bool) -> Self {
        Self {
            transport,
            codec,
            diagnostics: Diagnostics::new(verbose),
            rendezvous: Rendezvous::Idle,
        }
    }

    /// Call remote function `name` with positional `args`.
    ///
    /// Returns the reply's `ret` value, or `Value::Null` when the reply has
    /// none.
    ///
    /// # Errors
    ///
    /// - `Error::Send`, `Error::Receive`, `Error::Timeout`: the exchange failed
    /// - `Error::Decode`: the reply bytes are not a valid message
    /// - `Error::Protocol`: the reply is not a response envelope
    /// - `Error::Remote`: the server reported `success: false`
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        debug!("Calling {name} with {} argument(s)", args.len());
        let reply = self.exchange(Request::new(name, args))?;
        Response::from_value(reply)?.into_result()
    }

    /// [`call`](Self::call), then collapse single-element and empty return
    /// arrays (see [`unpack_returns`]).
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call).
    pub fn call_unpacked(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        self.call(name, args).map(unpack_returns)
    }

    fn exchange(&mut self, request: Request) -> Result<Value> {
        if self.rendezvous == Rendezvous::AwaitingReply {
            warn!("Previous request never got its reply, resetting transport");
            self.transport.reset()?;
            self.rendezvous = Rendezvous::Idle;
        }

        let envelope = request.into_value();
        let raw = self.codec.encode(&envelope)?;
        self.diagnostics.outgoing(&envelope, &raw);

        // A rejected send leaves nothing to wait for
        self.transport.send(&raw)?;
        self.rendezvous = Rendezvous::AwaitingReply;

        let reply = self.transport.receive()?;
        self.rendezvous = Rendezvous::Idle;
        self.diagnostics.incoming_raw(&reply);

        let response = self.codec.decode(&reply)?;
        self.diagnostics.incoming(&response);
        Ok(response)
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.diagnostics.set_enabled(verbose);
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.diagnostics.is_enabled()
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the connection. Dropping the client does the same.
    pub fn close(self) {
        debug!("Closing RPC client");
        drop(self);
    }
}

impl<T: Transport, C: Codec> std::fmt::Debug for RpcClient<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("verbose", &self.diagnostics.is_enabled())
            .field("rendezvous", &self.rendezvous)
            .finish_non_exhaustive()
    }
}

/// Thread-safe handle to one [`RpcClient`].
///
/// Each `call` holds the lock for its whole send/receive pair, so calls from
/// different threads are serialized and can never pick up each other's
/// replies.
pub struct SharedClient<T: Transport = ZmqTransport, C: Codec = CborCodec> {
    inner: Arc<Mutex<RpcClient<T, C>>>,
}

impl<T: Transport, C: Codec> SharedClient<T, C> {
    #[must_use]
    pub fn new(client: RpcClient<T, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// # Errors
    ///
    /// Same as [`RpcClient::call`].
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        self.with(|client| client.call(name, args))
    }

    /// # Errors
    ///
    /// Same as [`RpcClient::call_unpacked`].
    pub fn call_unpacked(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        self.with(|client| client.call_unpacked(name, args))
    }

    /// Run `f` with exclusive access to the client.
    pub fn with<R>(&self, f: impl FnOnce(&mut RpcClient<T, C>) -> R) -> R {
        // A panic mid-call leaves the rendezvous state consistent: the next
        // call resets the transport if a reply was outstanding.
        let mut client = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut client)
    }
}

impl<T: Transport, C: Codec> Clone for SharedClient<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport, C: Codec> From<RpcClient<T, C>> for SharedClient<T, C> {
    fn from(client: RpcClient<T, C>) -> Self {
        Self::new(client)
    }
}
