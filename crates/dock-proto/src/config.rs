use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub stations: StationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

/// REST API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

/// Feed socket settings (comment/reply broadcast channel).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_feed_port")]
    pub port: u16,
}

/// Identity the TUI announces on the feed socket.  The daemon trusts it;
/// there is no authentication model here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_username")]
    pub username: String,
}

/// Where station data comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsConfig {
    /// CityBikes network endpoint polled by the snapshot collector.
    #[serde(default = "default_network_url")]
    pub network_url: String,
    /// Poll interval for the collector.  0 disables polling; the daemon then
    /// seeds dummy snapshots so trend charts still render.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_http_port(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_feed_port(),
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
        }
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            network_url: default_network_url(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_state_file() -> PathBuf {
    platform::data_dir().join("feed.json")
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8990
}

fn default_feed_port() -> u16 {
    platform::FEED_TCP_PORT
}

fn default_username() -> String {
    std::env::var("USER").unwrap_or_else(|_| "rider".to_string())
}

fn default_network_url() -> String {
    "https://api.citybik.es/v2/networks/pittsburgh".to_string()
}

fn default_poll_interval_secs() -> u64 {
    600
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.http.enabled);
        assert_eq!(config.http.port, 8990);
        assert_eq!(config.feed.port, platform::FEED_TCP_PORT);
        assert!(config.stations.network_url.starts_with("https://"));
        assert!(config.daemon.state_file.ends_with("velodock/feed.json"));
    }

    #[test]
    fn test_partial_toml_uses_field_defaults() {
        let config: Config = toml::from_str("[user]\nusername = \"alice\"\n").unwrap();
        assert_eq!(config.user.username, "alice");
        assert_eq!(config.http.port, 8990);
    }
}
