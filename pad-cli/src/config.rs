//! Configuration management for livepad.
//!
//! Settings live in a TOML file. Every field has a default, so a missing
//! file or a partial one is fine.

use anyhow::{Context, Result};
use livepad_client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// WebSocket base URL.
    #[serde(default = "default_ws_base")]
    pub ws_base: String,
    /// HTTP base URL for session creation.
    #[serde(default = "default_http_base")]
    pub http_base: String,
    /// Page share links point at (defaults to `{http_base}/coding/`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// Display name announced on join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Delay before reconnecting, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Outbound drain interval, in milliseconds.
    #[serde(default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,
    /// Outbound queue bound.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_ws_base() -> String {
    "ws://localhost:8080".to_string()
}

fn default_http_base() -> String {
    "http://localhost:8080".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3_000
}

fn default_drain_interval_ms() -> u64 {
    50
}

fn default_queue_capacity() -> usize {
    livepad_core::DEFAULT_QUEUE_CAPACITY
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ws_base: default_ws_base(),
            http_base: default_http_base(),
            page_url: None,
            name: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            drain_interval_ms: default_drain_interval_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl CliConfig {
    /// Platform default location of `config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("io", "livepad", "livepad")
            .context("Could not determine home directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Write to `path`, creating parent directories.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to encode configuration")?;
        tokio::fs::write(path, contents)
            .await
            .context("Failed to save configuration")?;
        Ok(())
    }

    /// Client configuration derived from these settings.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.ws_base, &self.http_base)
            .with_reconnect_delay(Duration::from_millis(self.reconnect_delay_ms))
            .with_drain_interval(Duration::from_millis(self.drain_interval_ms))
            .with_queue_capacity(self.queue_capacity);
        if let Some(page_url) = &self.page_url {
            config = config.with_page_url(page_url);
        }
        if let Some(name) = &self.name {
            config = config.with_display_name(name);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("config.toml")).await.unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[tokio::test]
    async fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "ws_base = \"wss://pad.example\"\nname = \"ada\"\n")
            .await
            .unwrap();

        let config = CliConfig::load(&path).await.unwrap();
        assert_eq!(config.ws_base, "wss://pad.example");
        assert_eq!(config.name.as_deref(), Some("ada"));
        assert_eq!(config.http_base, "http://localhost:8080");
        assert_eq!(config.reconnect_delay_ms, 3_000);
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = CliConfig {
            page_url: Some("https://pad.example/coding/".into()),
            queue_capacity: 64,
            ..CliConfig::default()
        };

        config.save(&path).await.unwrap();
        let loaded = CliConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "reconnect_delay_ms = \"soon\"").await.unwrap();

        assert!(CliConfig::load(&path).await.is_err());
    }

    #[test]
    fn client_config_carries_settings() {
        let config = CliConfig {
            name: Some("grace".into()),
            reconnect_delay_ms: 500,
            ..CliConfig::default()
        };

        let client = config.client_config();
        assert_eq!(client.display_name.as_deref(), Some("grace"));
        assert_eq!(client.reconnect_delay, Duration::from_millis(500));
        assert_eq!(client.page_url, "http://localhost:8080/coding/");
    }
}
