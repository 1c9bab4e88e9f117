//! Verbose tracing of the messages a client exchanges.
//!
//! Events go to the `zrapi::diagnostics` target at `INFO` level, so they can
//! be routed independently of the crate's own `debug!` logging:
//!
//! ```text
//! RUST_LOG=zrapi::diagnostics=info
//! ```
//!
//! Nothing here influences a call; when disabled nothing is rendered.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::info;
use zrapi_types::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// A request envelope and its encoding, right before sending.
    pub fn outgoing(&self, envelope: &Value, raw: &[u8]) {
        if !self.enabled {
            return;
        }
        info!(target: "zrapi::diagnostics", "Sending: {envelope:#}");
        info!(
            target: "zrapi::diagnostics",
            "Sending raw len={}, base64={}",
            raw.len(),
            STANDARD.encode(raw)
        );
    }

    /// Reply bytes as received, before decoding.
    pub fn incoming_raw(&self, raw: &[u8]) {
        if !self.enabled {
            return;
        }
        info!(
            target: "zrapi::diagnostics",
            "Received raw len={}, base64={}",
            raw.len(),
            STANDARD.encode(raw)
        );
    }

    /// The decoded reply envelope.
    pub fn incoming(&self, envelope: &Value) {
        if !self.enabled {
            return;
        }
        info!(target: "zrapi::diagnostics", "Received: {envelope:#}");
    }
}
