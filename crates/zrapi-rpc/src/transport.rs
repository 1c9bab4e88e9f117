//! Request/reply transport.
//!
//! A [`Transport`] moves opaque messages: one `send`, then exactly one
//! `receive`, then the next `send`. Replies are matched to requests by
//! that ordering alone, so implementations need not (and [`ZmqTransport`]
//! does not) support more than one outstanding request.
//!
//! [`ZmqTransport`] talks to the server over a ZeroMQ REQ socket. The socket
//! is asynchronous (`zeromq`); the transport owns a private current-thread
//! tokio runtime and blocks on it, so no threads run outside of a call.
//! Called from a thread that is already inside a tokio runtime, each blocking
//! step runs on a short-lived scoped thread instead, since tokio refuses to
//! nest `block_on`.

use std::future::Future;
use std::io;
use std::panic;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use tokio::runtime::{Handle, Runtime};
use tracing::debug;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::config::ClientConfig;

/// Blocking, strictly alternating message channel.
pub trait Transport {
    /// # Errors
    ///
    /// Returns `TransportError::Send` if the channel rejects the message.
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError>;

    /// Block until the reply to the last `send` arrives.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Receive` if the channel closes and
    /// `TransportError::Timeout` if a configured deadline passes.
    fn receive(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Drop any half-finished exchange so that the next `send` starts clean
    /// and no late reply to an abandoned request can be received.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Connect` if the channel cannot be re-established.
    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send(message)
    }

    fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).receive()
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        (**self).reset()
    }
}

/// Errors that can occur moving messages
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("receive timed out after {0:?}")]
    Timeout(Duration),
}

/// Private runtime driving the socket's I/O tasks.
struct IoRuntime {
    // Only `None` once dropped
    runtime: Option<Runtime>,
}

impl IoRuntime {
    fn new() -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime: Some(runtime),
        })
    }

    /// Block the calling thread until `future` completes.
    fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Send,
        F::Output: Send,
    {
        let Some(runtime) = self.runtime.as_ref() else {
            unreachable!("I/O runtime used after drop");
        };

        if Handle::try_current().is_err() {
            return runtime.block_on(future);
        }

        thread::scope(|scope| {
            scope
                .spawn(|| runtime.block_on(future))
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload))
        })
    }
}

impl Drop for IoRuntime {
    fn drop(&mut self) {
        // A plain drop waits on the blocking pool, which panics inside an
        // async context
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// ZeroMQ REQ socket transport.
///
/// Every operation blocks the calling thread. It may be used from inside a
/// tokio runtime, but then it stalls that runtime's worker for the duration
/// of a call; prefer `spawn_blocking` in async code.
pub struct ZmqTransport {
    // Declared before `runtime` so the socket is torn down while the runtime
    // that drives its connection tasks still exists.
    socket: ReqSocket,
    runtime: IoRuntime,
    endpoint: String,
    connect_timeout: Duration,
    receive_timeout: Option<Duration>,
}

impl ZmqTransport {
    /// Connect to `config.endpoint()`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Connect` if the runtime cannot be created or
    /// the server is not reachable within the connect timeout.
    pub fn connect(config: &ClientConfig) -> Result<Self, TransportError> {
        let endpoint = config.endpoint();
        let runtime = IoRuntime::new().map_err(|e| TransportError::Connect {
                endpoint: endpoint.clone(),
                reason: format!("cannot start I/O runtime: {e}"),
            })?;

        let connect_timeout = config.connect_timeout();
        let socket = open_socket(&runtime, &endpoint, connect_timeout)?;
        debug!("Connected to {endpoint}");

        Ok(Self {
            socket,
            runtime,
            endpoint,
            connect_timeout,
            receive_timeout: config.receive_timeout(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn open_socket(
    runtime: &IoRuntime,
    endpoint: &str,
    timeout: Duration,
) -> Result<ReqSocket, TransportError> {
    let mut socket = ReqSocket::new();
    let connected =
        runtime.block_on(async { tokio::time::timeout(timeout, socket.connect(endpoint)).await });

    match connected {
        Ok(Ok(())) => Ok(socket),
        Ok(Err(e)) => Err(TransportError::Connect {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(TransportError::Connect {
            endpoint: endpoint.to_string(),
            reason: format!("no connection within {timeout:?}"),
        }),
    }
}

impl Transport for ZmqTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        let Self {
            socket, runtime, ..
        } = self;
        let message = ZmqMessage::from(Bytes::copy_from_slice(message));

        runtime
            .block_on(socket.send(message))
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        let Self {
            socket,
            runtime,
            receive_timeout,
            ..
        } = self;

        let reply = match *receive_timeout {
            Some(limit) => runtime
                .block_on(async { tokio::time::timeout(limit, socket.recv()).await })
                .map_err(|_| TransportError::Timeout(limit))?,
            None => runtime.block_on(socket.recv()),
        }
        .map_err(|e| TransportError::Receive(e.to_string()))?;

        if reply.len() != 1 {
            return Err(TransportError::Receive(format!(
                "expected a single-frame reply, got {} frames",
                reply.len()
            )));
        }

        reply
            .get(0)
            .map(|frame| frame.to_vec())
            .ok_or_else(|| TransportError::Receive("empty reply".to_string()))
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        debug!("Reconnecting to {}", self.endpoint);
        let fresh = open_socket(&self.runtime, &self.endpoint, self.connect_timeout)?;

        let stale = std::mem::replace(&mut self.socket, fresh);
        self.runtime.block_on(async move { drop(stale) });
        Ok(())
    }
}

impl std::fmt::Debug for ZmqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqTransport")
            .field("endpoint", &self.endpoint)
            .field("connect_timeout", &self.connect_timeout)
            .field("receive_timeout", &self.receive_timeout)
            .finish_non_exhaustive()
    }
}
