use anyhow::{Context, Result, bail};
use reconcile::DEFAULT_FALLBACK_THEMES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use wpcli::{ConnectionProfile, SettleConfig};

use crate::cli::ConnectionArgs;

// ============================================================================
// Config File
// ============================================================================

/// Contents of `config.toml`. Every section is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// wp-cli executable name or path
    pub wp_binary: String,

    /// Where the site lives
    pub connection: ConnectionProfile,

    /// Delays and polling after mutations
    pub settle: SettleSection,

    /// Theme replacement preferences
    pub themes: ThemesSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleSection {
    pub plugin_delay_secs: u64,
    pub theme_delay_secs: u64,
    pub polls: u32,
    pub backoff_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemesSection {
    /// Tried in order when the active theme has to be deleted
    pub fallbacks: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wp_binary: wpcli::DEFAULT_PROGRAM.to_string(),
            connection: ConnectionProfile::default(),
            settle: SettleSection::default(),
            themes: ThemesSection::default(),
        }
    }
}

impl Default for SettleSection {
    fn default() -> Self {
        Self {
            plugin_delay_secs: 3,
            theme_delay_secs: 2,
            polls: 1,
            backoff_factor: 2.0,
        }
    }
}

impl SettleSection {
    /// Longest settle delay accepted from the config file
    const MAX_DELAY_SECS: u64 = 3600;

    /// Reject values that would make the re-read schedule meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            bail!("settle.backoff_factor must be a number >= 1.0, got {}", self.backoff_factor);
        }
        for (key, secs) in [
            ("plugin_delay_secs", self.plugin_delay_secs),
            ("theme_delay_secs", self.theme_delay_secs),
        ] {
            if secs > Self::MAX_DELAY_SECS {
                bail!("settle.{key} must be at most {}, got {secs}", Self::MAX_DELAY_SECS);
            }
        }
        Ok(())
    }
}

impl Default for ThemesSection {
    fn default() -> Self {
        Self {
            fallbacks: DEFAULT_FALLBACK_THEMES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Config {
    /// Load config from `path`, or defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))?;
        config
            .settle
            .validate()
            .with_context(|| format!("Invalid [settle] section in {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply command-line overrides on top of the file
    pub fn apply_overrides(&mut self, args: &ConnectionArgs) {
        if let Some(ssh) = &args.ssh {
            self.connection.ssh_target.clone_from(ssh);
        }
        if let Some(path) = &args.path {
            self.connection.remote_path.clone_from(path);
        }
        if args.allow_root {
            self.connection.allow_root = true;
        }
        if let Some(wp) = &args.wp {
            self.wp_binary.clone_from(wp);
        }
    }

    pub fn plugin_settle(&self) -> SettleConfig {
        self.settle_for(self.settle.plugin_delay_secs)
    }

    pub fn theme_settle(&self) -> SettleConfig {
        self.settle_for(self.settle.theme_delay_secs)
    }

    fn settle_for(&self, delay_secs: u64) -> SettleConfig {
        SettleConfig::new(Duration::from_secs(delay_secs))
            .with_polls(self.settle.polls)
            .with_backoff(self.settle.backoff_factor)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.wp_binary, "wp");
        assert!(config.connection.is_local());
        assert_eq!(config.plugin_settle().delay, Duration::from_secs(3));
        assert_eq!(config.theme_settle().delay, Duration::from_secs(2));
        assert_eq!(config.themes.fallbacks[0], "twentytwentyfour");
    }

    #[test]
    fn test_parse_partial() {
        let toml = r#"
wp_binary = "/usr/local/bin/wp"

[connection]
ssh_target = "deploy@web1"
remote_path = "/var/www/html"

[settle]
polls = 4
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.wp_binary, "/usr/local/bin/wp");
        assert_eq!(config.connection.ssh_target, "deploy@web1");
        assert!(!config.connection.allow_root);
        assert_eq!(config.settle.polls, 4);
        assert_eq!(config.settle.plugin_delay_secs, 3);
        assert_eq!(config.plugin_settle().max_polls, 4);
        assert_eq!(config.themes, ThemesSection::default());
    }

    #[test]
    fn test_parse_fallbacks() {
        let config: Config = toml::from_str("[themes]\nfallbacks = [\"generatepress\"]\n").unwrap();
        assert_eq!(config.themes.fallbacks, vec!["generatepress"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "wp_binary = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn test_load_rejects_negative_backoff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[settle]\npolls = 2\nbackoff_factor = -2.0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("config.toml"));
        assert!(message.contains("backoff_factor"));
    }

    #[test]
    fn test_validate_settle() {
        assert!(SettleSection::default().validate().is_ok());

        let fractional = SettleSection {
            backoff_factor: 0.5,
            ..SettleSection::default()
        };
        assert!(fractional.validate().is_err());

        let huge = SettleSection {
            theme_delay_secs: u64::MAX,
            ..SettleSection::default()
        };
        let err = huge.validate().unwrap_err();
        assert!(err.to_string().contains("theme_delay_secs"));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.connection.remote_path = "/from/file".to_string();

        config.apply_overrides(&ConnectionArgs {
            ssh: Some("docker:wp".to_string()),
            path: None,
            allow_root: true,
            wp: Some("wp-cli.phar".to_string()),
        });

        assert_eq!(config.connection.ssh_target, "docker:wp");
        assert_eq!(config.connection.remote_path, "/from/file");
        assert!(config.connection.allow_root);
        assert_eq!(config.wp_binary, "wp-cli.phar");
    }
}
