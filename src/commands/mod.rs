//! Subcommand implementations

pub mod report;
pub mod trade;

use anyhow::{Context, Result};
use tracing::info;

use futures_trader::config::GatewayMode;
use futures_trader::gateway::{
    BridgeGateway, GatewayReply, GatewayResult, InputOrder, PaperGateway, SettlementConfirm,
    TradingGateway,
};
use futures_trader::session::{Session, SessionOptions};
use futures_trader::store::SqliteStore;
use futures_trader::trader::{parse_direction, Trader};
use futures_trader::{Config, Direction, Instrument};

/// Gateway picked from the configuration at runtime
pub enum Gateway {
    Paper(PaperGateway),
    Bridge(BridgeGateway),
}

impl Gateway {
    /// Simulated trading always uses the paper gateway
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.trader.simulate || config.gateway.mode == GatewayMode::Paper {
            info!(
                "Using paper gateway ({} reference prices)",
                config.gateway.paper_prices.len()
            );
            return Ok(Gateway::Paper(PaperGateway::with_prices(
                config
                    .gateway
                    .paper_prices()
                    .into_iter()
                    .map(|(instrument, price)| (instrument.as_str().to_string(), price)),
            )));
        }

        let url = config
            .gateway
            .bridge_url
            .as_deref()
            .context("gateway.bridge_url is not set")?;
        info!("Using gateway bridge at {}", url);
        let gateway = BridgeGateway::new(url, config.trader.request_timeout())
            .context("Failed to build gateway bridge client")?;
        Ok(Gateway::Bridge(gateway))
    }
}

impl TradingGateway for Gateway {
    async fn confirm_settlement(&self, request: &SettlementConfirm) -> GatewayResult<GatewayReply> {
        match self {
            Gateway::Paper(gateway) => gateway.confirm_settlement(request).await,
            Gateway::Bridge(gateway) => gateway.confirm_settlement(request).await,
        }
    }

    async fn insert_order(&self, order: &InputOrder) -> GatewayResult<GatewayReply> {
        match self {
            Gateway::Paper(gateway) => gateway.insert_order(order).await,
            Gateway::Bridge(gateway) => gateway.insert_order(order).await,
        }
    }
}

pub fn load_config(config_path: &str) -> Result<Config> {
    dotenv::dotenv().ok();
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;
    info!("Loaded configuration from: {}", config_path);
    Ok(config)
}

pub fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.state.db_path)
        .with_context(|| format!("Failed to open state database {}", config.state.db_path))
}

/// Confirm settlement and build a trader for the configured account
pub async fn connect(config: &Config) -> Result<Trader<Gateway, SqliteStore>> {
    let store = open_store(config)?;
    let gateway = Gateway::from_config(config)?;
    let options = SessionOptions::default().with_request_timeout(config.trader.request_timeout());

    let session = Session::connect(&config.account, gateway, options)
        .await
        .context("Failed to start gateway session")?;

    Ok(Trader::new(
        session,
        store,
        config.trader.execution_context(),
    ))
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")
}

/// Comma-separated instrument list; `None` or blank means all instruments
pub fn parse_instruments(list: Option<&str>) -> Vec<Instrument> {
    list.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Instrument::new)
            .collect()
    })
    .unwrap_or_default()
}

pub fn parse_optional_direction(direction: Option<&str>) -> Result<Option<Direction>> {
    direction
        .map(|text| parse_direction(text).map_err(anyhow::Error::from))
        .transpose()
}
