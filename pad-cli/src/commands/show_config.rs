//! Show the effective configuration.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::CliConfig;

/// Run the config command. With `save`, the settings are written to `path`
/// first.
pub async fn run(path: &Path, settings: &CliConfig, save: bool) -> Result<()> {
    let rendered = render(path, settings)?;
    if save {
        settings.save(path).await?;
        println!("Saved configuration to {}", path.display());
    }
    println!("{rendered}");
    Ok(())
}

fn render(path: &Path, settings: &CliConfig) -> Result<String> {
    let body = toml::to_string_pretty(settings).context("Failed to encode configuration")?;
    let client = settings.client_config();

    let mut out = format!("# {}\n{body}\n", path.display());
    out.push_str(&format!("# connect: {}\n", client.connect_url(None)?));
    out.push_str(&format!("# create:  {}\n", client.create_url()?));
    out.push_str(&format!("# share:   {}", client.share_url(None)?));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lists_settings_and_urls() {
        let settings = CliConfig {
            ws_base: "wss://pad.example".into(),
            http_base: "https://pad.example".into(),
            ..CliConfig::default()
        };

        let out = render(Path::new("/tmp/config.toml"), &settings).unwrap();

        assert!(out.starts_with("# /tmp/config.toml\n"));
        assert!(out.contains("ws_base = \"wss://pad.example\""));
        assert!(out.contains("# connect: wss://pad.example/coding/connect/"));
        assert!(out.contains("# create:  https://pad.example/coding/create"));
        assert!(out.contains("# share:   https://pad.example/coding/"));
    }

    #[tokio::test]
    async fn save_writes_effective_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livepad").join("config.toml");
        let settings = CliConfig {
            ws_base: "wss://pad.example".into(),
            name: Some("ada".into()),
            ..CliConfig::default()
        };

        run(&path, &settings, true).await.unwrap();

        assert_eq!(CliConfig::load(&path).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn unusable_settings_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let settings = CliConfig {
            ws_base: "nonsense".into(),
            ..CliConfig::default()
        };

        assert!(run(&path, &settings, true).await.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn render_rejects_unusable_urls() {
        let settings = CliConfig {
            ws_base: "nonsense".into(),
            ..CliConfig::default()
        };

        assert!(render(Path::new("config.toml"), &settings).is_err());
    }
}
