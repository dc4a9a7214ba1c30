//! Engine configuration: one validated value object shared by the scorer and
//! the risk manager.
//!
//! Parsed from TOML with per-field defaults, validated once, never mutated by
//! the engine. `fingerprint()` identifies a configuration by the blake3 hash of
//! its canonical JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Entry filters, sizing and exit parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrategyConfig {
    pub max_positions: usize,
    /// Base position size in quote currency.
    #[serde(alias = "position_size_usdt")]
    pub position_size: f64,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    pub trailing_stop_percent: f64,
    pub trailing_stop_enabled: bool,
    /// Minimum 24h quote volume for a pair to be considered.
    #[serde(alias = "min_volume_usdt")]
    pub min_volume: f64,
    /// Minimum 24h price change in percent.
    #[serde(alias = "min_price_change_percent")]
    pub min_price_change: f64,
    pub use_multi_timeframe: bool,
    /// Alert floor applied by the caller on top of the regime threshold.
    pub min_signal_strength: f64,
    pub quote_asset: String,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            max_positions: 3,
            position_size: 100.0,
            stop_loss_percent: 2.0,
            take_profit_percent: 5.0,
            trailing_stop_percent: 1.5,
            trailing_stop_enabled: true,
            min_volume: 1_000_000.0,
            min_price_change: 3.0,
            use_multi_timeframe: true,
            min_signal_strength: 0.6,
            quote_asset: "USDT".to_string(),
        }
    }
}

/// Capital protection limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    /// Period loss (quote currency) at which new entries stop.
    #[serde(alias = "max_daily_loss_usdt")]
    pub max_daily_loss: f64,
    /// Period loss as a percentage of initial balance at which new entries stop.
    pub max_drawdown_percent: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss: 50.0,
            max_drawdown_percent: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.strategy;
        if s.max_positions == 0 {
            return Err(invalid("max_positions", "must be at least 1"));
        }
        if !(s.position_size.is_finite() && s.position_size > 0.0) {
            return Err(invalid("position_size", "must be positive"));
        }
        for (field, value) in [
            ("stop_loss_percent", s.stop_loss_percent),
            ("take_profit_percent", s.take_profit_percent),
            ("trailing_stop_percent", s.trailing_stop_percent),
        ] {
            if !(value > 0.0 && value < 100.0) {
                return Err(invalid(field, format!("{value} is outside (0, 100)")));
            }
        }
        if !(s.min_volume.is_finite() && s.min_volume >= 0.0) {
            return Err(invalid("min_volume", "must be zero or positive"));
        }
        if !s.min_price_change.is_finite() {
            return Err(invalid("min_price_change", "must be finite"));
        }
        if !(0.0..=1.0).contains(&s.min_signal_strength) {
            return Err(invalid("min_signal_strength", "must be within [0, 1]"));
        }
        if s.quote_asset.trim().is_empty() {
            return Err(invalid("quote_asset", "must not be empty"));
        }

        let r = &self.risk;
        if !(r.max_daily_loss.is_finite() && r.max_daily_loss > 0.0) {
            return Err(invalid("max_daily_loss", "must be positive"));
        }
        if !(0.0..=100.0).contains(&r.max_drawdown_percent) {
            return Err(invalid("max_drawdown_percent", "must be within [0, 100], 0 disables"));
        }
        Ok(())
    }

    /// blake3 hex digest of the canonical JSON form.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
