//! Application configuration: the engine settings plus the exchange, Telegram
//! and scheduling sections only the binary needs.
//!
//! Load order: TOML file (or defaults), then environment overrides, then
//! validation. `.env` is read by `main` before anything else.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use scout_core::config::{EngineConfig, RiskConfig, StrategyConfig};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "scout.toml";
pub const MAINNET_URL: &str = "https://api.binance.com";
pub const TESTNET_URL: &str = "https://testnet.binance.vision";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Overrides the testnet/mainnet choice when set.
    pub base_url: Option<String>,
    pub testnet: bool,
    pub api_key: String,
    #[serde(alias = "secret")]
    pub secret_key: String,
    pub recv_window_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            testnet: true,
            api_key: String::new(),
            secret_key: String::new(),
            recv_window_ms: 5_000,
            timeout_secs: 10,
        }
    }
}

impl ExchangeConfig {
    pub fn base_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/'),
            None if self.testnet => TESTNET_URL,
            None => MAINNET_URL,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.secret_key.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
            api_url: "https://api.telegram.org".to_string(),
        }
    }
}

/// Timing of the scan loop. All values are whole units named by the field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    pub scan_interval_secs: u64,
    pub status_interval_secs: u64,
    /// Minimum gap between two alerts for the same symbol.
    pub alert_cooldown_mins: i64,
    /// Alert timestamps older than this are forgotten.
    pub alert_retention_mins: i64,
    pub hot_coins_interval_mins: i64,
    pub daily_report_hours: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 30,
            status_interval_secs: 300,
            alert_cooldown_mins: 10,
            alert_retention_mins: 30,
            hot_coins_interval_mins: 5,
            daily_report_hours: 24,
        }
    }
}

impl ScheduleConfig {
    pub fn alert_cooldown(&self) -> Duration {
        Duration::minutes(self.alert_cooldown_mins)
    }

    pub fn alert_retention(&self) -> Duration {
        Duration::minutes(self.alert_retention_mins)
    }

    pub fn hot_coins_interval(&self) -> Duration {
        Duration::minutes(self.hot_coins_interval_mins)
    }

    pub fn daily_report_interval(&self) -> Duration {
        Duration::hours(self.daily_report_hours)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::seconds(self.status_interval_secs as i64)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
    pub exchange: ExchangeConfig,
    pub telegram: TelegramConfig,
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    /// Load from `path`, or from `scout.toml` when present, or defaults.
    /// Environment overrides are applied before validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    warn!("no {DEFAULT_CONFIG_PATH} found, using built-in defaults");
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: AppConfig = toml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Credentials and chat details from the environment win over the file.
    /// `BINANCE_TESTNET` can only switch testnet off, and only with "false".
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("BINANCE_API_KEY") {
            self.exchange.api_key = key;
        }
        if let Some(secret) = non_empty("BINANCE_SECRET_KEY") {
            self.exchange.secret_key = secret;
        }
        if lookup("BINANCE_TESTNET").as_deref() == Some("false") {
            self.exchange.testnet = false;
        }
        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(chat) = non_empty("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.engine().validate()?;

        let s = &self.schedule;
        if s.scan_interval_secs == 0 {
            bail!("schedule.scan_interval_secs must be at least 1");
        }
        for (field, value) in [
            ("alert_cooldown_mins", s.alert_cooldown_mins),
            ("alert_retention_mins", s.alert_retention_mins),
            ("hot_coins_interval_mins", s.hot_coins_interval_mins),
            ("daily_report_hours", s.daily_report_hours),
        ] {
            if value <= 0 {
                bail!("schedule.{field} must be positive, got {value}");
            }
        }
        if s.alert_retention_mins < s.alert_cooldown_mins {
            bail!("schedule.alert_retention_mins must not be shorter than alert_cooldown_mins");
        }

        if self.telegram.enabled
            && (self.telegram.bot_token.is_empty() || self.telegram.chat_id.is_empty())
        {
            bail!("telegram is enabled but bot_token or chat_id is missing");
        }
        Ok(())
    }

    /// The part of the configuration the engine sees.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            strategy: self.strategy.clone(),
            risk: self.risk.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const SAMPLE: &str = r#"
[strategy]
max_positions = 2
position_size_usdt = 250.0
min_volume_usdt = 5000000.0
min_signal_strength = 0.7

[risk]
max_daily_loss_usdt = 80.0

[exchange]
testnet = true
api_key = "file-key"

[telegram]
enabled = false

[schedule]
scan_interval_secs = 15
"#;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.exchange.base_url(), TESTNET_URL);
        assert_eq!(config.schedule.alert_cooldown(), Duration::minutes(10));
    }

    #[test]
    fn loads_file_with_aliases() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.strategy.max_positions, 2);
        assert_eq!(config.strategy.position_size, 250.0);
        assert_eq!(config.strategy.min_volume, 5_000_000.0);
        assert_eq!(config.risk.max_daily_loss, 80.0);
        assert_eq!(config.exchange.api_key, "file-key");
        assert_eq!(config.schedule.scan_interval_secs, 15);
        // Untouched fields keep their defaults
        assert_eq!(config.schedule.daily_report_hours, 24);
        assert_eq!(config.strategy.quote_asset, "USDT");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config: AppConfig = toml::from_str(SAMPLE).unwrap();
        config.apply_env(env(&[
            ("BINANCE_API_KEY", "env-key"),
            ("BINANCE_SECRET_KEY", "env-secret"),
            ("BINANCE_TESTNET", "false"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]));
        assert_eq!(config.exchange.api_key, "env-key");
        assert_eq!(config.exchange.secret_key, "env-secret");
        assert!(!config.exchange.testnet);
        assert_eq!(config.exchange.base_url(), MAINNET_URL);
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, "42");
    }

    #[test]
    fn testnet_only_disabled_by_literal_false() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("BINANCE_TESTNET", "0"), ("BINANCE_API_KEY", "")]));
        assert!(config.exchange.testnet);
        assert!(config.exchange.api_key.is_empty());
    }

    #[test]
    fn explicit_base_url_wins() {
        let mut config = AppConfig::default();
        config.exchange.base_url = Some("http://localhost:9000/".into());
        assert_eq!(config.exchange.base_url(), "http://localhost:9000");
    }

    #[test]
    fn telegram_needs_token_and_chat() {
        let mut config = AppConfig::default();
        config.telegram.enabled = true;
        config.telegram.bot_token = "123:abc".into();
        assert!(config.validate().is_err());
        config.telegram.chat_id = "42".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_engine_section_rejected() {
        let mut config = AppConfig::default();
        config.strategy.max_positions = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_positions"));
    }

    #[test]
    fn retention_shorter_than_cooldown_rejected() {
        let mut config = AppConfig::default();
        config.schedule.alert_retention_mins = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn engine_view_carries_both_sections() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let engine = config.engine();
        assert_eq!(engine.strategy, config.strategy);
        assert_eq!(engine.risk, config.risk);
        assert!(engine.fingerprint().is_ok());
    }
}
