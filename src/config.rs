use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Environment variable that overrides `account.access_token`.
pub const ACCESS_TOKEN_ENV: &str = "X_ACCESS_TOKEN";

/// Top-level application config deserialized from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub account: AccountConfig,
    pub player: PlayerConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// X account credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// OAuth 2.0 user-context access token with `tweet.write` scope.
    #[serde(default)]
    pub access_token: String,
}

/// The player this instance tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// MLBAM person id.
    pub id: u32,
    pub name: String,
    /// Appended to every tweet, without the leading `#`.
    #[serde(default)]
    pub hashtag: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweetStyle {
    /// Statcast metrics, season context and emoji.
    #[default]
    Enhanced,
    /// Home-run block plus a plain result line for everything else.
    Compact,
}

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Polling interval in seconds for at-bat detection.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub style: TweetStyle,
    /// How long fetched season stats stay fresh.
    #[serde(default = "default_season_stats_ttl")]
    pub season_stats_ttl_secs: u64,
    /// Pause between consecutive posts within one cycle.
    #[serde(default = "default_inter_post_delay")]
    pub inter_post_delay_ms: u64,
    /// Pinged after every cycle so the host does not idle the process.
    #[serde(default)]
    pub keepalive_url: Option<String>,
}

fn default_poll_interval() -> u64 {
    120
}

fn default_season_stats_ttl() -> u64 {
    600
}

fn default_inter_post_delay() -> u64 {
    1000
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            style: TweetStyle::default(),
            season_stats_ttl_secs: default_season_stats_ttl(),
            inter_post_delay_ms: default_inter_post_delay(),
            keepalive_url: None,
        }
    }
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Write config to the given TOML file path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Replace the access token with `X_ACCESS_TOKEN` when it is set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.account.access_token = token.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.player.id == 0 {
            bail!("player.id must be a valid MLBAM id");
        }
        if self.player.name.trim().is_empty() {
            bail!("player.name cannot be empty");
        }
        if self.settings.poll_interval_secs == 0 {
            bail!("settings.poll_interval_secs must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[player]
id = 596019
name = "Francisco Lindor"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg: AppConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(cfg.player.id, 596019);
        assert!(cfg.player.hashtag.is_none());
        assert!(cfg.account.access_token.is_empty());
        assert_eq!(cfg.settings.poll_interval_secs, 120);
        assert_eq!(cfg.settings.season_stats_ttl_secs, 600);
        assert_eq!(cfg.settings.style, TweetStyle::Enhanced);
        assert!(cfg.settings.keepalive_url.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn full_config_parses() {
        let cfg: AppConfig = toml::from_str(
            r#"
[account]
access_token = "tok"

[player]
id = 665742
name = "Juan Soto"
hashtag = "LGM"

[settings]
poll_interval_secs = 30
style = "compact"
inter_post_delay_ms = 0
keepalive_url = "https://soto-tracker.example.com/"
"#,
        )
        .unwrap();
        assert_eq!(cfg.account.access_token, "tok");
        assert_eq!(cfg.player.hashtag.as_deref(), Some("LGM"));
        assert_eq!(cfg.settings.style, TweetStyle::Compact);
        assert_eq!(cfg.settings.inter_post_delay_ms, 0);
        assert_eq!(
            cfg.settings.keepalive_url.as_deref(),
            Some("https://soto-tracker.example.com/")
        );
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut cfg: AppConfig = toml::from_str(MINIMAL).unwrap();
        cfg.settings.poll_interval_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_name() {
        let mut cfg: AppConfig = toml::from_str(MINIMAL).unwrap();
        cfg.player.name = "  ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg: AppConfig = toml::from_str(MINIMAL).unwrap();
        cfg.account.access_token = "secret".into();
        cfg.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.account.access_token, "secret");
        assert_eq!(loaded.player.name, "Francisco Lindor");
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
