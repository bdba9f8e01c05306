use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    2333
}

fn default_password() -> String {
    "youshallnotpass".to_string()
}

fn default_node_id() -> String {
    "main".to_string()
}

fn default_client_name() -> String {
    format!("sobasa/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_ms() -> u64 {
    3_000
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

/// Connection settings for one Lavalink node.
#[derive(Clone, Serialize, Deserialize)]
pub struct LavalinkConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_password", skip_serializing)]
    pub password: String,
    /// Use `https`/`wss` instead of `http`/`ws`.
    #[serde(default)]
    pub secure: bool,
    /// Name of the node in logs and events.
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Per-request timeout for REST calls. Default: 3000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Pause between WebSocket reconnect attempts. Default: 5000.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for LavalinkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: default_password(),
            secure: false,
            node_id: default_node_id(),
            client_name: default_client_name(),
            request_timeout_ms: default_request_timeout_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl fmt::Debug for LavalinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LavalinkConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"[REDACTED]")
            .field("secure", &self.secure)
            .field("node_id", &self.node_id)
            .field("client_name", &self.client_name)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .finish()
    }
}

impl LavalinkConfig {
    /// Base URL of the v4 REST API, without a trailing slash.
    pub fn rest_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}:{}/v4", self.host, self.port)
    }

    /// URL of the v4 event WebSocket.
    pub fn websocket_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}:{}/v4/websocket", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}
