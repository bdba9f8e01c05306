use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

fn default_prefix() -> String {
    "!".to_string()
}

fn default_status_text() -> String {
    "Bezzębna Stara Sobasa".to_string()
}

fn default_true() -> bool {
    true
}

fn default_gateway_url() -> String {
    "wss://gateway.discord.gg".to_string()
}

fn default_api_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default, skip_serializing)]
    pub token: String,
    /// Command prefix.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Shown as the "Watching ..." activity.
    #[serde(default = "default_status_text")]
    pub status_text: String,
    #[serde(default = "default_true")]
    pub self_deaf: bool,
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            prefix: default_prefix(),
            status_text: default_status_text(),
            self_deaf: true,
            gateway_url: default_gateway_url(),
            api_url: default_api_url(),
            request_timeout_ms: default_request_timeout_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("prefix", &self.prefix)
            .field("status_text", &self.status_text)
            .field("self_deaf", &self.self_deaf)
            .field("gateway_url", &self.gateway_url)
            .field("api_url", &self.api_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .finish()
    }
}

impl DiscordConfig {
    /// Gateway URL with the protocol version and encoding pinned.
    pub fn gateway_endpoint(base: &str) -> String {
        format!("{}/?v=10&encoding=json", base.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_redacted() {
        let config = DiscordConfig {
            token: "MTIz.abc.def".to_string(),
            ..DiscordConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("MTIz"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn endpoint_pins_version() {
        assert_eq!(
            DiscordConfig::gateway_endpoint("wss://gateway.discord.gg/"),
            "wss://gateway.discord.gg/?v=10&encoding=json"
        );
    }

    #[test]
    fn defaults_from_empty_toml() {
        let config: DiscordConfig = toml::from_str("token = \"t\"").unwrap();
        assert_eq!(config.prefix, "!");
        assert!(config.self_deaf);
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
    }
}
