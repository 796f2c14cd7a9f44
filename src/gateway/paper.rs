//! Paper trading gateway
//!
//! Fills every order immediately at the instrument's reference price. Used
//! when trading is simulated, and scriptable so lifecycle edge cases
//! (rejections, stalls) can be reproduced deterministically.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

use super::{
    Fill, GatewayError, GatewayReply, GatewayResult, InputOrder, SettlementConfirm, TradingGateway,
};
use crate::types::{Instrument, Price};

/// Venue error id for an instrument the venue doesn't list
pub const INSTRUMENT_NOT_FOUND_ERROR_ID: i32 = 16;

/// What the next order submission should do instead of a normal fill
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Reject with the given error id and message
    Reject { error_id: i32, error_msg: String },
    /// Fill at this price regardless of the reference price
    FillAt(Price),
    /// Accept without any fill entry
    EmptyFill,
    /// Sleep before answering normally
    Stall(Duration),
    /// Fail the transport
    Disconnect,
}

#[derive(Debug, Default)]
pub struct PaperGateway {
    prices: Mutex<HashMap<Instrument, Price>>,
    script: Mutex<VecDeque<Scripted>>,
    settlement: Mutex<Option<Scripted>>,
    submitted: Mutex<Vec<InputOrder>>,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway quoting the given reference prices
    pub fn with_prices<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, Price)>,
        S: AsRef<str>,
    {
        let gateway = Self::new();
        for (instrument, price) in prices {
            gateway.set_price(Instrument::new(instrument), price);
        }
        gateway
    }

    pub fn set_price(&self, instrument: Instrument, price: Price) {
        lock(&self.prices).insert(instrument, price);
    }

    /// Queue behaviour for the next order submission
    pub fn push(&self, scripted: Scripted) {
        lock(&self.script).push_back(scripted);
    }

    pub fn reject_next(&self, error_id: i32, error_msg: impl Into<String>) {
        self.push(Scripted::Reject {
            error_id,
            error_msg: error_msg.into(),
        });
    }

    /// Make settlement acknowledgement fail
    pub fn reject_settlement(&self, error_id: i32, error_msg: impl Into<String>) {
        *lock(&self.settlement) = Some(Scripted::Reject {
            error_id,
            error_msg: error_msg.into(),
        });
    }

    /// Delay every settlement acknowledgement
    pub fn stall_settlement(&self, delay: Duration) {
        *lock(&self.settlement) = Some(Scripted::Stall(delay));
    }

    /// Fail the transport on settlement acknowledgement
    pub fn disconnect_settlement(&self) {
        *lock(&self.settlement) = Some(Scripted::Disconnect);
    }

    /// Every order received so far, in submission order
    pub fn submitted(&self) -> Vec<InputOrder> {
        lock(&self.submitted).clone()
    }

    fn fill_reply(&self, order: &InputOrder) -> GatewayReply {
        match lock(&self.prices).get(&order.instrument) {
            Some(price) => GatewayReply::accepted(vec![Fill {
                price: *price,
                volume: order.volume,
            }]),
            None => GatewayReply::rejected(
                INSTRUMENT_NOT_FOUND_ERROR_ID,
                format!("instrument {} not found", order.instrument),
            ),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TradingGateway for PaperGateway {
    async fn confirm_settlement(&self, request: &SettlementConfirm) -> GatewayResult<GatewayReply> {
        debug!(
            "Paper settlement confirm: broker={} investor={}",
            request.broker_id, request.investor_id
        );
        let scripted = lock(&self.settlement).clone();
        match scripted {
            Some(Scripted::Reject {
                error_id,
                error_msg,
            }) => Ok(GatewayReply::rejected(error_id, error_msg)),
            Some(Scripted::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(GatewayReply::accepted(Vec::new()))
            }
            Some(Scripted::Disconnect) => Err(GatewayError::Disconnected),
            Some(Scripted::FillAt(_)) | Some(Scripted::EmptyFill) | None => {
                Ok(GatewayReply::accepted(Vec::new()))
            }
        }
    }

    async fn insert_order(&self, order: &InputOrder) -> GatewayResult<GatewayReply> {
        lock(&self.submitted).push(order.clone());
        let scripted = lock(&self.script).pop_front();

        let reply = match scripted {
            None => self.fill_reply(order),
            Some(Scripted::Reject {
                error_id,
                error_msg,
            }) => GatewayReply::rejected(error_id, error_msg),
            Some(Scripted::FillAt(price)) => GatewayReply::accepted(vec![Fill {
                price,
                volume: order.volume,
            }]),
            Some(Scripted::EmptyFill) => GatewayReply::accepted(Vec::new()),
            Some(Scripted::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                self.fill_reply(order)
            }
            Some(Scripted::Disconnect) => return Err(GatewayError::Disconnected),
        };

        debug!(
            "Paper order {} {} {} x{} -> error_id={}",
            order.order_ref, order.instrument, order.direction, order.volume, reply.error_id
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::OffsetFlag;
    use crate::types::Direction;
    use rust_decimal_macros::dec;

    fn order(instrument: &str) -> InputOrder {
        InputOrder::market(
            "9999",
            "000001",
            Instrument::new(instrument),
            "000000000001",
            Direction::Buy,
            OffsetFlag::Open,
            1,
        )
    }

    #[tokio::test]
    async fn test_fills_at_reference_price() {
        let gateway = PaperGateway::with_prices([("rb2410", Price::new(dec!(3500)))]);
        let reply = gateway.insert_order(&order("rb2410")).await.unwrap();

        assert!(reply.is_accepted());
        assert_eq!(reply.fills[0].price, Price::new(dec!(3500)));
        assert_eq!(gateway.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_instrument_is_rejected() {
        let gateway = PaperGateway::new();
        let reply = gateway.insert_order(&order("zz9999")).await.unwrap();

        assert_eq!(reply.error_id, INSTRUMENT_NOT_FOUND_ERROR_ID);
        assert!(reply.fills.is_empty());
    }

    #[tokio::test]
    async fn test_script_is_consumed_in_order() {
        let gateway = PaperGateway::with_prices([("rb2410", Price::new(dec!(3500)))]);
        gateway.reject_next(31, "insufficient margin");
        gateway.push(Scripted::FillAt(Price::new(dec!(3490))));

        let first = gateway.insert_order(&order("rb2410")).await.unwrap();
        let second = gateway.insert_order(&order("rb2410")).await.unwrap();
        let third = gateway.insert_order(&order("rb2410")).await.unwrap();

        assert_eq!(first.error_id, 31);
        assert_eq!(second.fills[0].price, Price::new(dec!(3490)));
        assert_eq!(third.fills[0].price, Price::new(dec!(3500)));
    }

    #[tokio::test]
    async fn test_settlement_rejection() {
        let gateway = PaperGateway::new();
        let request = SettlementConfirm {
            broker_id: "9999".into(),
            investor_id: "000001".into(),
        };
        assert!(gateway.confirm_settlement(&request).await.unwrap().is_accepted());

        gateway.reject_settlement(3, "not logged in");
        let reply = gateway.confirm_settlement(&request).await.unwrap();
        assert_eq!(reply.error_id, 3);

        gateway.disconnect_settlement();
        assert!(matches!(
            gateway.confirm_settlement(&request).await,
            Err(GatewayError::Disconnected)
        ));
    }
}
