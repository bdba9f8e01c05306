use serde::Deserialize;
use sobasa_discord::DiscordConfig;
use sobasa_lavalink::LavalinkConfig;
use sobasa_playback::{ContentConfig, OrchestratorConfig, PlaybackConfig, SchedulerConfig};
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub lavalink: LavalinkConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// The orchestrator's slice of the configuration.
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            prefix: self.discord.prefix.clone(),
            playback: self.playback.clone(),
            scheduler: self.scheduler.clone(),
            content: self.content.clone(),
        }
    }
}

/// Bind address of the health endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Loads the configuration from `path` (defaults when the file does not
/// exist) and applies `SOBASA_*` environment overrides.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    if config.discord.token.trim().is_empty() {
        return Err(ConfigError::Missing("discord.token (or SOBASA_DISCORD_TOKEN)"));
    }
    Ok(config)
}

fn flag(value: &str) -> bool {
    value == "true" || value == "1"
}

/// Applies overrides found through `var`. Unparseable values are ignored.
pub fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(token) = var("SOBASA_DISCORD_TOKEN") {
        config.discord.token = token;
    }
    if let Some(prefix) = var("SOBASA_PREFIX") {
        config.discord.prefix = prefix;
    }
    if let Some(host) = var("SOBASA_LAVALINK_HOST") {
        config.lavalink.host = host;
    }
    if let Some(port) = var("SOBASA_LAVALINK_PORT") {
        if let Ok(parsed) = port.parse() {
            config.lavalink.port = parsed;
        }
    }
    if let Some(password) = var("SOBASA_LAVALINK_PASSWORD") {
        config.lavalink.password = password;
    }
    if let Some(secure) = var("SOBASA_LAVALINK_SECURE") {
        config.lavalink.secure = flag(&secure);
    }
    if let Some(dir) = var("SOBASA_FRAGMENTS_DIR") {
        config.content.fragments_dir = dir.into();
    }
    if let Some(enabled) = var("SOBASA_SCHEDULER_ENABLED") {
        config.scheduler.enabled = flag(&enabled);
    }
    if let Some(host) = var("SOBASA_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("SOBASA_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = var("SOBASA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("SOBASA_LOG_JSON") {
        config.logging.json = flag(&json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn reads_sections_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[discord]
token = "file-token"
prefix = "sob."

[lavalink]
host = "lavalink"
password = "pw"

[playback]
connect_timeout_ms = 2500

[scheduler]
enabled = false

[server]
port = 8080

[logging]
json = true
"#
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.discord.token, "file-token");
        assert_eq!(config.lavalink.host, "lavalink");
        assert_eq!(config.lavalink.port, 2333);
        assert_eq!(config.server.port, 8080);
        assert!(config.logging.json);

        let orchestrator = config.orchestrator();
        assert_eq!(orchestrator.prefix, "sob.");
        assert_eq!(orchestrator.playback.connect_timeout(), Duration::from_millis(2500));
        assert!(!orchestrator.scheduler.enabled);
        assert_eq!(orchestrator.content.fragment_count, 10);
    }

    #[test]
    fn missing_file_without_token_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        if std::env::var("SOBASA_DISCORD_TOKEN").is_ok() {
            return;
        }
        assert!(matches!(
            load_config(path.to_str()),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[discord\ntoken = ").unwrap();
        assert!(matches!(
            load_config(file.path().to_str()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> = [
            ("SOBASA_DISCORD_TOKEN", "env-token"),
            ("SOBASA_LAVALINK_PORT", "443"),
            ("SOBASA_LAVALINK_SECURE", "1"),
            ("SOBASA_PORT", "not-a-port"),
            ("SOBASA_SCHEDULER_ENABLED", "false"),
            ("SOBASA_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.discord.token, "env-token");
        assert_eq!(config.lavalink.port, 443);
        assert!(config.lavalink.secure);
        assert_eq!(config.server.port, 3000);
        assert!(!config.scheduler.enabled);
        assert_eq!(config.logging.level, "debug");
    }
}
