//! Read-only commands: positions, volume, orders
//!
//! These read the state database directly; no gateway session is opened.

use anyhow::Result;
use rust_decimal::Decimal;

use futures_trader::store::{OrderFilter, PositionFilter, TradingStore};
use futures_trader::{OrderState, PositionState};

use super::{load_config, open_store, parse_instruments, parse_optional_direction};

pub fn positions(config_path: String, state: Option<String>, json: bool) -> Result<()> {
    let config = load_config(&config_path)?;
    let store = open_store(&config)?;
    let state = state.map(|s| s.parse::<PositionState>()).transpose()?;

    let positions = store.find_positions(&PositionFilter {
        scope: config.trader.execution_context().scope(),
        state,
        ..Default::default()
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&positions)?);
        return Ok(());
    }

    println!(
        "{:>6} {:<10} {:<5} {:>6} {:>12} {:>12} {:<6} {}",
        "ID", "INSTRUMENT", "DIR", "VOLUME", "OPEN", "CLOSE", "STATE", "OPENED"
    );
    for position in &positions {
        let close_price = position
            .close_price
            .map(|price| price.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6} {:<10} {:<5} {:>6} {:>12} {:>12} {:<6} {}",
            position.id,
            position.instrument.as_str(),
            position.direction.as_str(),
            position.volume,
            position.open_price.to_string(),
            close_price,
            position.state.as_str(),
            position.open_time.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!("{} positions", positions.len());
    Ok(())
}

pub fn volume(
    config_path: String,
    instruments: Option<String>,
    direction: Option<String>,
) -> Result<()> {
    let config = load_config(&config_path)?;
    let store = open_store(&config)?;
    let instruments = parse_instruments(instruments.as_deref());
    let direction = parse_optional_direction(direction.as_deref())?;

    let positions = store.find_positions(&PositionFilter {
        scope: config.trader.execution_context().scope(),
        state: Some(PositionState::Open),
        instruments: Some(instruments),
        direction,
    })?;

    let total: u64 = positions.iter().map(|p| u64::from(p.volume)).sum();
    let notional: Decimal = positions
        .iter()
        .map(|p| p.open_price.inner() * Decimal::from(p.volume))
        .sum();

    println!("Open positions: {}", positions.len());
    println!("Total volume:   {}", total);
    println!("Price x volume: {}", notional);
    Ok(())
}

pub fn orders(config_path: String, state: Option<String>, json: bool) -> Result<()> {
    let config = load_config(&config_path)?;
    let store = open_store(&config)?;
    let state = state.map(|s| s.parse::<OrderState>()).transpose()?;

    let orders = store.find_orders(&OrderFilter {
        scope: config.trader.execution_context().scope(),
        state,
        position_id: None,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&orders)?);
        return Ok(());
    }

    println!(
        "{:>6} {:<12} {:<10} {:<5} {:<5} {:>6} {:>12} {:<6} {:>8} {}",
        "ID", "REF", "INSTRUMENT", "ACT", "DIR", "VOLUME", "PRICE", "STATE", "POSITION", "ERROR"
    );
    for order in &orders {
        let position = order
            .position_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let error = if order.error_id != 0 {
            format!("[{}] {}", order.error_id, order.error_msg)
        } else {
            String::new()
        };
        println!(
            "{:>6} {:<12} {:<10} {:<5} {:<5} {:>6} {:>12} {:<6} {:>8} {}",
            order.id,
            order.order_ref,
            order.instrument.as_str(),
            order.action.as_str(),
            order.direction.as_str(),
            order.volume,
            order.price.to_string(),
            order.state.as_str(),
            position,
            error
        );
    }
    println!("{} orders", orders.len());
    Ok(())
}
