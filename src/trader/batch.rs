//! Close-all

use serde::Serialize;
use tracing::{info, warn};

use super::{TradeError, TradeResult, Trader};
use crate::gateway::TradingGateway;
use crate::store::{Position, TradingStore};
use crate::types::{Direction, Instrument};

/// A position that stayed open, and why
#[derive(Debug)]
pub struct CloseFailure {
    pub position: Position,
    pub error: TradeError,
}

/// Outcome of [`Trader::close_all`]
#[derive(Debug, Default)]
pub struct CloseAllReport {
    /// Closed positions, as returned by each close
    pub closed: Vec<Position>,
    /// Snapshots taken before the close attempt
    pub failed: Vec<CloseFailure>,
}

impl CloseAllReport {
    pub fn fail_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Serializable summary for reports and logs
#[derive(Debug, Serialize)]
pub struct CloseAllSummary {
    pub closed: usize,
    pub failed: usize,
    pub failures: Vec<(i64, i32, String)>,
}

impl From<&CloseAllReport> for CloseAllSummary {
    fn from(report: &CloseAllReport) -> Self {
        Self {
            closed: report.closed.len(),
            failed: report.fail_count(),
            failures: report
                .failed
                .iter()
                .map(|f| (f.position.id, f.error.code(), f.error.to_string()))
                .collect(),
        }
    }
}

impl<G: TradingGateway, S: TradingStore> Trader<G, S> {
    /// Close every open position in scope matching the filters, oldest first.
    ///
    /// Positions are closed one at a time; a failure is recorded and the
    /// batch moves on. Only failing to enumerate the positions is an error.
    pub async fn close_all(
        &mut self,
        instruments: Option<&[Instrument]>,
        direction: Option<Direction>,
    ) -> TradeResult<CloseAllReport> {
        let positions = self.open_positions(instruments, direction)?;
        info!("Closing {} open positions", positions.len());

        let mut report = CloseAllReport::default();
        for position in positions {
            match self.close(position.id).await {
                Ok(closed) => report.closed.push(closed),
                Err(error) => {
                    warn!("Position {} not closed: {}", position.id, error);
                    report.failed.push(CloseFailure { position, error });
                }
            }
        }

        info!(
            "Close-all done: {} closed, {} failed",
            report.closed.len(),
            report.fail_count()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Account;
    use crate::gateway::PaperGateway;
    use crate::session::{Session, SessionOptions};
    use crate::store::SqliteStore;
    use crate::trader::ExecutionContext;
    use crate::types::{PositionState, Price};
    use rust_decimal_macros::dec;

    async fn trader() -> Trader<PaperGateway, SqliteStore> {
        let account = Account {
            name: "sim".into(),
            remarks: String::new(),
            front_address: "tcp://127.0.0.1:10130".into(),
            md_front_address: String::new(),
            broker_id: "9999".into(),
            user_id: "000001".into(),
            password: String::new(),
        };
        let gateway = PaperGateway::with_prices([
            ("rb2410", Price::new(dec!(3500))),
            ("i2409", Price::new(dec!(812.5))),
        ]);
        let session = Session::connect(&account, gateway, SessionOptions::default())
            .await
            .unwrap();
        Trader::new(session, SqliteStore::in_memory().unwrap(), ExecutionContext::new(1))
    }

    #[tokio::test]
    async fn test_close_all_continues_past_failures() {
        let mut trader = trader().await;
        for _ in 0..3 {
            trader.open("rb2410", Direction::Buy, None).await.unwrap();
        }

        // Second close is rejected
        let gateway = trader.session().gateway();
        gateway.push(crate::gateway::paper::Scripted::FillAt(Price::new(dec!(3510))));
        gateway.reject_next(50, "market closed");

        let report = trader.close_all(None, None).await.unwrap();
        assert_eq!(report.fail_count(), 1);
        assert_eq!(report.closed.len(), 2);
        assert!(!report.is_complete());
        assert_eq!(report.failed[0].error.code(), 50);

        let failed_id = report.failed[0].position.id;
        let still_open = trader.list_positions(Some(PositionState::Open)).unwrap();
        assert_eq!(still_open.len(), 1);
        assert_eq!(still_open[0].id, failed_id);

        let summary = CloseAllSummary::from(&report);
        assert_eq!(summary.closed, 2);
        assert_eq!(summary.failures[0].0, failed_id);
    }

    #[tokio::test]
    async fn test_close_all_filters() {
        let mut trader = trader().await;
        trader.open("rb2410", Direction::Buy, None).await.unwrap();
        trader.open("rb2410", Direction::Sell, None).await.unwrap();
        trader.open("i2409", Direction::Buy, None).await.unwrap();

        let report = trader
            .close_all(Some(&[Instrument::new("rb2410")]), Some(Direction::Sell))
            .await
            .unwrap();
        assert_eq!(report.closed.len(), 1);
        assert_eq!(report.closed[0].direction, Direction::Sell);
        assert_eq!(trader.total_volume(None, None).unwrap(), 2);

        let report = trader.close_all(None, None).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.closed.len(), 2);

        let report = trader.close_all(None, None).await.unwrap();
        assert!(report.closed.is_empty());
    }
}
