//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable support for gateway credentials.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::trader::ExecutionContext;
use crate::types::{Instrument, Price};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub account: Account,
    pub trader: TraderConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub state: StateConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        // Secrets from the environment win over the file
        if let Ok(password) = std::env::var("CTP_PASSWORD") {
            config.account.password = password;
        }
        if let Ok(bridge_url) = std::env::var("CTP_BRIDGE_URL") {
            config.gateway.bridge_url = Some(bridge_url);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trader.default_volume == 0 {
            bail!("trader.default_volume must be at least 1");
        }
        if self.trader.request_timeout_secs == 0 {
            bail!("trader.request_timeout_secs must be at least 1");
        }
        if self.account.broker_id.is_empty() || self.account.user_id.is_empty() {
            bail!("account.broker_id and account.user_id are required");
        }
        if self.gateway.mode == GatewayMode::Bridge && self.gateway.bridge_url.is_none() {
            bail!("gateway.bridge_url is required in bridge mode (or set CTP_BRIDGE_URL)");
        }
        Ok(())
    }
}

/// Gateway account credentials. Immutable once loaded.
#[derive(Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub remarks: String,
    /// Trading front address
    pub front_address: String,
    /// Market-data front address
    #[serde(default)]
    pub md_front_address: String,
    pub broker_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("front_address", &self.front_address)
            .field("md_front_address", &self.md_front_address)
            .field("broker_id", &self.broker_id)
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Trader configuration: execution context and order defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderConfig {
    /// Owning task; positions and orders are scoped by it when set
    #[serde(default)]
    pub task_id: Option<i64>,
    /// Owning strategy executer; further narrows the scope when set
    #[serde(default)]
    pub strategy_executer_id: Option<i64>,
    /// Lots per order when the caller gives no volume. Required, no implicit default.
    pub default_volume: u32,
    /// Maximum simultaneously open long positions in scope
    #[serde(default)]
    pub max_buy_positions: Option<u32>,
    /// Maximum simultaneously open short positions in scope
    #[serde(default)]
    pub max_sell_positions: Option<u32>,
    /// Mark records as simulated; also forces the paper gateway
    #[serde(default)]
    pub simulate: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl TraderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext {
            task_id: self.task_id,
            strategy_executer_id: self.strategy_executer_id,
            simulate: self.simulate,
            default_volume: self.default_volume,
            max_buy_positions: self.max_buy_positions,
            max_sell_positions: self.max_sell_positions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    #[default]
    Paper,
    Bridge,
}

/// Gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub mode: GatewayMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_url: Option<String>,
    /// Reference fill prices for the paper gateway
    #[serde(default)]
    pub paper_prices: HashMap<String, Price>,
}

impl GatewayConfig {
    pub fn paper_prices(&self) -> Vec<(Instrument, Price)> {
        self.paper_prices
            .iter()
            .map(|(instrument, price)| (Instrument::new(instrument), *price))
            .collect()
    }
}

/// Order/position store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    pub db_path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        StateConfig {
            db_path: "state/trading.db".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "account": {
            "name": "sim",
            "front_address": "tcp://180.168.146.187:10130",
            "broker_id": "9999",
            "user_id": "000001",
            "password": "secret"
        },
        "trader": {
            "task_id": 7,
            "default_volume": 2,
            "max_buy_positions": 1
        },
        "gateway": {
            "paper_prices": {"rb2410": 3500}
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.trader.task_id, Some(7));
        assert_eq!(config.trader.strategy_executer_id, None);
        assert_eq!(config.trader.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.gateway.mode, GatewayMode::Paper);
        assert_eq!(config.state.db_path, "state/trading.db");
        assert_eq!(config.gateway.paper_prices().len(), 1);

        let context = config.trader.execution_context();
        assert_eq!(context.default_volume, 2);
        assert_eq!(context.max_buy_positions, Some(1));
    }

    #[test]
    fn test_default_volume_is_required() {
        let json = SAMPLE.replace("\"default_volume\": 2,", "");
        assert!(serde_json::from_str::<Config>(&json).is_err());
    }

    #[test]
    fn test_zero_default_volume_rejected() {
        let json = SAMPLE.replace("\"default_volume\": 2", "\"default_volume\": 0");
        let config: Config = serde_json::from_str(&json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bridge_mode_needs_url() {
        let mut config: Config = serde_json::from_str(SAMPLE).unwrap();
        config.gateway.mode = GatewayMode::Bridge;
        assert!(config.validate().is_err());

        config.gateway.bridge_url = Some("http://127.0.0.1:8600".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_password_is_redacted() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        let debug = format!("{:?}", config.account);
        assert!(!debug.contains("secret"));

        let json = serde_json::to_string(&config.account).unwrap();
        assert!(!json.contains("secret"));
    }
}
