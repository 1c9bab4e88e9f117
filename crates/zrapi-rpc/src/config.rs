//! Client configuration.
//!
//! Every field has a default, so `{}` (or [`ClientConfig::default`]) targets
//! `tcp://localhost:23000` with diagnostics off and no receive timeout.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 23000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Connection parameters for [`RpcClient`](crate::RpcClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Emit every request and reply through the diagnostics channel
    #[serde(default)]
    pub verbose: bool,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// `None` blocks until a reply arrives or the channel fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_timeout_ms: Option<u64>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            verbose: false,
            connect_timeout_ms: default_connect_timeout(),
            receive_timeout_ms: None,
        }
    }
}

const KNOWN_FIELDS: &[&str] = &[
    "host",
    "port",
    "verbose",
    "connectTimeoutMs",
    "receiveTimeoutMs",
];

impl ClientConfig {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = duration_to_ms(timeout);
        self
    }

    #[must_use]
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout_ms = Some(duration_to_ms(timeout));
        self
    }

    /// Transport address, e.g. `tcp://localhost:23000`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') {
            format!("tcp://[{}]:{}", self.host, self.port)
        } else {
            format!("tcp://{}:{}", self.host, self.port)
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout_ms.map(Duration::from_millis)
    }

    /// # Errors
    ///
    /// Returns `Error::Config` for an empty host, port 0, or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(Error::Config("port must not be 0".to_string()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(Error::Config("connectTimeoutMs must be positive".to_string()));
        }
        if self.receive_timeout_ms == Some(0) {
            return Err(Error::Config("receiveTimeoutMs must be positive".to_string()));
        }
        Ok(())
    }

    /// Parse a JSON config, warning about fields this client does not know.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the JSON is malformed or fails validation.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("invalid client config: {e}")))?;

        for field in unknown_fields(&raw) {
            warn!("Unknown client config field: {field}");
        }

        let config: Self = serde_json::from_value(raw)
            .map_err(|e| Error::Config(format!("invalid client config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn unknown_fields(raw: &serde_json::Value) -> Vec<&str> {
    let serde_json::Value::Object(obj) = raw else {
        return Vec::new();
    };

    obj.keys()
        .map(String::as_str)
        .filter(|key| !KNOWN_FIELDS.contains(key))
        .collect()
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 23000);
        assert!(!config.verbose);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert!(config.receive_timeout().is_none());
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(ClientConfig::default().endpoint(), "tcp://localhost:23000");
    }

    #[test]
    fn test_ipv6_endpoint() {
        assert_eq!(ClientConfig::new("::1", 23000).endpoint(), "tcp://[::1]:23000");
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new("10.0.0.2", 19997)
            .with_verbose(true)
            .with_connect_timeout(Duration::from_millis(250))
            .with_receive_timeout(Duration::from_secs(2));

        assert_eq!(config.endpoint(), "tcp://10.0.0.2:19997");
        assert!(config.verbose);
        assert_eq!(config.connect_timeout_ms, 250);
        assert_eq!(config.receive_timeout_ms, Some(2000));
    }

    #[test]
    fn test_from_json_empty_uses_defaults() {
        let config = ClientConfig::from_json("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_from_json_camel_case() {
        let config = ClientConfig::from_json(
            r#"{"host": "robot", "port": 24000, "verbose": true, "receiveTimeoutMs": 1500}"#,
        )
        .unwrap();

        assert_eq!(config.host, "robot");
        assert_eq!(config.port, 24000);
        assert!(config.verbose);
        assert_eq!(config.receive_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_from_json_ignores_unknown_fields() {
        let config = ClientConfig::from_json(r#"{"cntport": 23001}"#).unwrap();
        assert_eq!(config.port, 23000);
    }

    #[test]
    fn test_unknown_fields_listed() {
        let raw = serde_json::json!({"host": "x", "cntport": 1, "sockets": 4});
        let mut unknown = unknown_fields(&raw);
        unknown.sort_unstable();
        assert_eq!(unknown, vec!["cntport", "sockets"]);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ClientConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = ClientConfig::from_json(r#"{"port": "many"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid client config"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ClientConfig::new("", 23000).validate().is_err());
        assert!(ClientConfig::new("localhost", 0).validate().is_err());

        let mut config = ClientConfig::default();
        config.receive_timeout_ms = Some(0);
        assert!(config.validate().is_err());

        config.receive_timeout_ms = None;
        config.connect_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_runs_validation() {
        let err = ClientConfig::from_json(r#"{"port": 0}"#).unwrap_err();
        assert_eq!(err.to_string(), "Config error: port must not be 0");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = ClientConfig::new("sim", 23010).with_verbose(true);
        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("connectTimeoutMs"));
        assert!(!json.contains("receiveTimeoutMs"));
        assert_eq!(ClientConfig::from_json(&json).unwrap(), config);
    }
}
