//! Order-placing commands: open, close, close-all

use anyhow::Result;
use tracing::{info, warn};

use futures_trader::trader::{parse_direction, CloseAllSummary};
use futures_trader::Instrument;

use super::{connect, load_config, parse_instruments, parse_optional_direction, runtime};

pub fn open(
    config_path: String,
    instrument: String,
    direction: String,
    volume: Option<u32>,
) -> Result<()> {
    let config = load_config(&config_path)?;
    // Reject bad input before any session or record exists
    let direction = parse_direction(&direction)?;

    runtime()?.block_on(async {
        let mut trader = connect(&config).await?;
        let position = trader
            .open(Instrument::new(&instrument), direction, volume)
            .await?;

        println!(
            "Opened position {}: {} {} x{} @ {}",
            position.id, position.instrument, position.direction, position.volume, position.open_price
        );
        Ok::<_, anyhow::Error>(())
    })
}

pub fn close(config_path: String, position_id: i64) -> Result<()> {
    let config = load_config(&config_path)?;

    runtime()?.block_on(async {
        let mut trader = connect(&config).await?;
        let position = trader.close(position_id).await?;

        let close_price = position
            .close_price
            .map(|price| price.to_string())
            .unwrap_or_default();
        println!(
            "Closed position {}: {} {} x{} opened @ {} closed @ {}",
            position.id,
            position.instrument,
            position.direction,
            position.volume,
            position.open_price,
            close_price
        );
        Ok::<_, anyhow::Error>(())
    })
}

pub fn close_all(
    config_path: String,
    instruments: Option<String>,
    direction: Option<String>,
    json: bool,
) -> Result<()> {
    let config = load_config(&config_path)?;
    let instruments = parse_instruments(instruments.as_deref());
    let direction = parse_optional_direction(direction.as_deref())?;

    runtime()?.block_on(async {
        let mut trader = connect(&config).await?;
        let report = trader.close_all(Some(&instruments), direction).await?;

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&CloseAllSummary::from(&report))?
            );
        } else {
            println!("\n{}", "=".repeat(60));
            println!("CLOSE ALL");
            println!("{}", "=".repeat(60));
            println!("Closed:  {}", report.closed.len());
            println!("Failed:  {}", report.fail_count());
            for failure in &report.failed {
                println!(
                    "  position {} ({} {} x{}): [{}] {}",
                    failure.position.id,
                    failure.position.instrument,
                    failure.position.direction,
                    failure.position.volume,
                    failure.error.code(),
                    failure.error
                );
            }
            println!("{}", "=".repeat(60));
        }

        if report.is_complete() {
            info!("All matching positions closed");
        } else {
            warn!("{} positions remain open", report.fail_count());
        }
        Ok::<_, anyhow::Error>(())
    })
}
