//! Scoped position and order queries
//!
//! Every query is narrowed to the trader's task, and to its strategy
//! executer when one is set.

use super::{TradeResult, Trader};
use crate::store::{Order, OrderFilter, Position, PositionFilter, TradingStore};
use crate::types::{Direction, Instrument, OrderState, PositionState};

impl<G, S: TradingStore> Trader<G, S> {
    /// Open positions in scope, oldest first. An empty instrument list
    /// matches every instrument.
    pub fn open_positions(
        &self,
        instruments: Option<&[Instrument]>,
        direction: Option<Direction>,
    ) -> TradeResult<Vec<Position>> {
        let filter = PositionFilter {
            scope: self.context.scope(),
            state: Some(PositionState::Open),
            instruments: instruments.map(<[Instrument]>::to_vec),
            direction,
        };
        Ok(self.store.find_positions(&filter)?)
    }

    /// Sum of open volume in scope (0 when nothing is open)
    pub fn total_volume(
        &self,
        instruments: Option<&[Instrument]>,
        direction: Option<Direction>,
    ) -> TradeResult<u64> {
        Ok(self
            .open_positions(instruments, direction)?
            .iter()
            .map(|position| u64::from(position.volume))
            .sum())
    }

    /// Positions in scope ordered by open time, oldest first
    pub fn list_positions(&self, state: Option<PositionState>) -> TradeResult<Vec<Position>> {
        let filter = PositionFilter {
            scope: self.context.scope(),
            state,
            ..Default::default()
        };
        Ok(self.store.find_positions(&filter)?)
    }

    /// Number of open positions in scope for one direction
    pub fn count_open(&self, direction: Direction) -> TradeResult<usize> {
        Ok(self.open_positions(None, Some(direction))?.len())
    }

    pub fn orders(&self, state: Option<OrderState>) -> TradeResult<Vec<Order>> {
        let filter = OrderFilter {
            scope: self.context.scope(),
            state,
            position_id: None,
        };
        Ok(self.store.find_orders(&filter)?)
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
    use crate::types::Price;
    use rust_decimal_macros::dec;

    async fn session() -> Session<PaperGateway> {
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
        Session::connect(&account, gateway, SessionOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_total_volume() {
        let mut trader = Trader::new(
            session().await,
            SqliteStore::in_memory().unwrap(),
            ExecutionContext::new(1),
        );
        assert_eq!(trader.total_volume(None, None).unwrap(), 0);

        trader.open("rb2410", Direction::Buy, Some(2)).await.unwrap();
        trader.open("i2409", Direction::Sell, Some(3)).await.unwrap();

        assert_eq!(trader.total_volume(None, None).unwrap(), 5);
        assert_eq!(trader.total_volume(Some(&[]), None).unwrap(), 5);
        assert_eq!(
            trader
                .total_volume(Some(&[Instrument::new("rb2410")]), None)
                .unwrap(),
            2
        );
        assert_eq!(trader.total_volume(None, Some(Direction::Sell)).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_queries_are_scoped_to_task() {
        let store = SqliteStore::in_memory().unwrap();
        let mut task_one = ExecutionContext::new(1);
        task_one.task_id = Some(1);
        let mut task_two = task_one.clone();
        task_two.task_id = Some(2);

        let mut first = Trader::new(session().await, store.clone(), task_one);
        let second = Trader::new(session().await, store.clone(), task_two);

        let position = first.open("rb2410", Direction::Buy, None).await.unwrap();
        first.close(position.id).await.unwrap();
        first.open("rb2410", Direction::Buy, None).await.unwrap();

        assert_eq!(first.list_positions(None).unwrap().len(), 2);
        assert_eq!(first.list_positions(Some(PositionState::Open)).unwrap().len(), 1);
        assert_eq!(first.orders(None).unwrap().len(), 3);
        assert_eq!(first.orders(Some(OrderState::Finish)).unwrap().len(), 3);

        assert!(second.list_positions(None).unwrap().is_empty());
        assert!(second.orders(None).unwrap().is_empty());
        assert_eq!(second.count_open(Direction::Buy).unwrap(), 0);
    }
}
