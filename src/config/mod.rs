//! Configuration management for RsiBot
//!
//! Loads defaults, then optional `config/default` and `config/local` files,
//! then `RSIBOT__*` environment variables. Secrets come from `.env`/env only.

use anyhow::{bail, Context, Result};
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::features::RsiEngine;
use crate::strategy::RsiThresholds;
use crate::types::Timeframe;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub oracle: OracleConfig,
    pub strategy: StrategyConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Bot version tag for logging
    pub tag: String,
    /// Instrument to analyze (Deriv symbol, e.g. R_100)
    pub symbol: String,
    /// Timeframe labels, in report order
    pub timeframes: Vec<String>,
    /// Candles requested per timeframe
    pub candle_count: usize,
    /// Log the alert instead of sending it
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Deriv WebSocket endpoint
    pub ws_url: String,
    /// Deriv application id
    pub app_id: u32,
    /// Upper bound on one candle request in milliseconds
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// RSI period
    pub rsi_period: usize,
    /// RSI below this is oversold
    pub oversold: f64,
    /// RSI above this is overbought
    pub overbought: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Telegram Bot API base URL
    pub telegram_api_url: String,
    /// Telegram parse mode for the alert text
    pub parse_mode: String,
    /// Append the run timestamp to the alert
    pub include_timestamp: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (RSIBOT__*)
            .add_source(
                Environment::with_prefix("RSIBOT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("bot.timeframes")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        Self::finish(config)
    }

    /// Built-in defaults only, no files or environment
    pub fn from_defaults() -> Result<Self> {
        let config = Self::defaults()?
            .build()
            .context("Failed to build configuration")?;
        Self::finish(config)
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>> {
        let timeframes: Vec<&str> = Timeframe::ALL.iter().map(|t| t.label()).collect();

        Ok(Config::builder()
            // Bot defaults
            .set_default("bot.tag", env!("CARGO_PKG_VERSION"))?
            .set_default("bot.symbol", "R_100")?
            .set_default("bot.timeframes", timeframes)?
            .set_default("bot.candle_count", 200)?
            .set_default("bot.dry_run", true)?
            // Oracle defaults
            .set_default("oracle.ws_url", "wss://ws.derivws.com/websockets/v3")?
            .set_default("oracle.app_id", 1089)?
            .set_default("oracle.request_timeout_ms", 15000)?
            // Strategy defaults
            .set_default("strategy.rsi_period", 14)?
            .set_default("strategy.oversold", 30.0)?
            .set_default("strategy.overbought", 70.0)?
            // Notify defaults
            .set_default("notify.telegram_api_url", "https://api.telegram.org")?
            .set_default("notify.parse_mode", "Markdown")?
            .set_default("notify.include_timestamp", true)?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?)
    }

    fn finish(config: Config) -> Result<Self> {
        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject configurations that cannot produce any result
    pub fn validate(&self) -> Result<()> {
        if self.bot.symbol.trim().is_empty() {
            bail!("bot.symbol must not be empty");
        }
        if self.bot.candle_count == 0 {
            bail!("bot.candle_count must be positive");
        }
        if self.strategy.rsi_period == 0 {
            bail!("strategy.rsi_period must be positive");
        }
        if self.bot.candle_count <= self.strategy.rsi_period {
            bail!(
                "bot.candle_count ({}) must exceed strategy.rsi_period ({})",
                self.bot.candle_count,
                self.strategy.rsi_period
            );
        }
        if self.oracle.request_timeout_ms == 0 {
            bail!("oracle.request_timeout_ms must be positive");
        }
        self.timeframes()?;
        self.thresholds()?;
        Ok(())
    }

    /// Configured timeframes, in order, without duplicates
    pub fn timeframes(&self) -> Result<Vec<Timeframe>> {
        if self.bot.timeframes.is_empty() {
            bail!("bot.timeframes must list at least one timeframe");
        }

        let mut out = Vec::with_capacity(self.bot.timeframes.len());
        for label in &self.bot.timeframes {
            let tf = Timeframe::from_str(label)
                .with_context(|| format!("Unknown timeframe label: {}", label))?;
            if out.contains(&tf) {
                bail!("Duplicate timeframe: {}", tf);
            }
            out.push(tf);
        }
        Ok(out)
    }

    pub fn thresholds(&self) -> Result<RsiThresholds> {
        RsiThresholds::new(self.strategy.oversold, self.strategy.overbought)
    }

    pub fn rsi_engine(&self) -> RsiEngine {
        RsiEngine::new(self.strategy.rsi_period)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle.request_timeout_ms)
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "bot={} symbol={} timeframes={:?} candles={} rsi={} zones={}/{} dry_run={}",
            self.bot.tag,
            self.bot.symbol,
            self.bot.timeframes,
            self.bot.candle_count,
            self.strategy.rsi_period,
            self.strategy.oversold,
            self.strategy.overbought,
            self.bot.dry_run
        )
    }

    /// Validate required environment variables
    pub fn validate_env(&self) -> Result<()> {
        if self.bot.dry_run {
            return Ok(());
        }

        let required = ["TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID"];
        for var in required {
            match std::env::var(var) {
                Ok(value) if !value.trim().is_empty() => {}
                _ => bail!("Required environment variable {} is not set", var),
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_and_validate() {
        let cfg = AppConfig::from_defaults().unwrap();

        assert_eq!(cfg.bot.symbol, "R_100");
        assert_eq!(cfg.bot.candle_count, 200);
        assert!(cfg.bot.dry_run);
        assert_eq!(cfg.timeframes().unwrap(), Timeframe::ALL.to_vec());
        assert_eq!(cfg.thresholds().unwrap(), RsiThresholds::default());
        assert_eq!(cfg.rsi_engine().period(), 14);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.oracle.app_id, 1089);
    }

    #[test]
    fn timeframes_keep_configured_order() {
        let mut cfg = AppConfig::from_defaults().unwrap();
        cfg.bot.timeframes = vec!["d1".into(), "M1".into(), "H4".into()];
        assert_eq!(
            cfg.timeframes().unwrap(),
            vec![Timeframe::D1, Timeframe::M1, Timeframe::H4]
        );
    }

    #[test]
    fn misconfiguration_is_fatal() {
        let base = AppConfig::from_defaults().unwrap();

        let mut cfg = base.clone();
        cfg.bot.timeframes = vec!["M1".into(), "15m".into()];
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.bot.timeframes = vec!["M1".into(), "m1".into()];
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.bot.timeframes.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.bot.candle_count = 14;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.strategy.oversold = 80.0;
        assert!(cfg.validate().is_err());

        let mut cfg = base;
        cfg.bot.symbol = "  ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn digest_has_no_secrets() {
        let cfg = AppConfig::from_defaults().unwrap();
        let digest = cfg.to_string();
        assert!(digest.contains("symbol=R_100"));
        assert!(!digest.to_lowercase().contains("token"));
    }
}
