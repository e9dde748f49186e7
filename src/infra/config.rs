// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::paths;

const BOT_TOKEN_ENV: &str = "SOUSCHEF_BOT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cooking: CookingConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cooking: CookingConfig::default(),
            telegram: TelegramConfig::default(),
            storage: StorageConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

/// Timer engine and controller tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookingConfig {
    /// How often a watcher re-reads its session.
    pub poll_interval_secs: u64,
    /// Extra wait when a watcher finds its step not armed yet.
    pub arm_wait_ms: u64,
    /// Minutes added or removed by one timer adjustment.
    pub adjust_minutes: i64,
    /// Floor applied to step durations (missing or zero durations included).
    pub min_step_minutes: u32,
}

impl Default for CookingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            arm_wait_ms: 1000,
            adjust_minutes: 1,
            min_step_minutes: 1,
        }
    }
}

impl CookingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn arm_wait(&self) -> Duration {
        Duration::from_millis(self.arm_wait_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub long_poll_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            long_poll_secs: 30,
        }
    }
}

impl TelegramConfig {
    /// Token from the environment, then from the file.
    pub fn resolve_token(&self) -> Option<String> {
        std::env::var(BOT_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.bot_token.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(paths::db_path)
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.cooking.poll_interval_secs == 0 {
            anyhow::bail!("cooking.poll_interval_secs must be greater than zero");
        }
        if self.cooking.adjust_minutes <= 0 {
            anyhow::bail!("cooking.adjust_minutes must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.cooking.poll_interval_secs, 10);
        assert_eq!(c.cooking.arm_wait(), Duration::from_secs(1));
        assert_eq!(c.cooking.adjust_minutes, 1);
        assert_eq!(c.cooking.min_step_minutes, 1);
        assert_eq!(c.telegram.long_poll_secs, 30);
        assert!(c.storage.db_path.is_none());
        assert_eq!(c.log_level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cooking.poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
log_level = "debug"

[cooking]
poll_interval_secs = 5
arm_wait_ms = 250
adjust_minutes = 2
min_step_minutes = 3

[telegram]
bot_token = "123:abc"
long_poll_secs = 50

[storage]
db_path = "/tmp/cook.db"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.cooking.poll_interval_secs, 5);
        assert_eq!(config.cooking.arm_wait(), Duration::from_millis(250));
        assert_eq!(config.cooking.adjust_minutes, 2);
        assert_eq!(config.cooking.min_step_minutes, 3);
        assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.telegram.long_poll_secs, 50);
        assert_eq!(
            config.storage.resolve_db_path(),
            PathBuf::from("/tmp/cook.db")
        );
    }

    #[test]
    fn test_load_rejects_zero_poll_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cooking]\npoll_interval_secs = 0").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"warn\"").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.cooking.poll_interval_secs, 10);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized.cooking.poll_interval_secs,
            config.cooking.poll_interval_secs
        );
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }
}
