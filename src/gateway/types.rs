//! Gateway order request types
//!
//! Every field of the gateway's input-order struct is strongly typed here and
//! only turned into the gateway's single-character codes by `code()` at the
//! submission edge.

use serde::{Deserialize, Serialize};

use crate::types::{Direction, Instrument, Price};

/// Gateway buy/sell code
pub fn direction_code(direction: Direction) -> char {
    match direction {
        Direction::Buy => '0',
        Direction::Sell => '1',
    }
}

/// Order price type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceType {
    AnyPrice,
    LimitPrice,
    BestPrice,
    LastPrice,
    LastPricePlusOneTicks,
    LastPricePlusTwoTicks,
    LastPricePlusThreeTicks,
    AskPrice1,
    AskPrice1PlusOneTicks,
    AskPrice1PlusTwoTicks,
    AskPrice1PlusThreeTicks,
    BidPrice1,
    BidPrice1PlusOneTicks,
    BidPrice1PlusTwoTicks,
    BidPrice1PlusThreeTicks,
}

impl PriceType {
    pub fn code(&self) -> char {
        match self {
            PriceType::AnyPrice => '1',
            PriceType::LimitPrice => '2',
            PriceType::BestPrice => '3',
            PriceType::LastPrice => '4',
            PriceType::LastPricePlusOneTicks => '5',
            PriceType::LastPricePlusTwoTicks => '6',
            PriceType::LastPricePlusThreeTicks => '7',
            PriceType::AskPrice1 => '8',
            PriceType::AskPrice1PlusOneTicks => '9',
            PriceType::AskPrice1PlusTwoTicks => 'A',
            PriceType::AskPrice1PlusThreeTicks => 'B',
            PriceType::BidPrice1 => 'C',
            PriceType::BidPrice1PlusOneTicks => 'D',
            PriceType::BidPrice1PlusTwoTicks => 'E',
            PriceType::BidPrice1PlusThreeTicks => 'F',
        }
    }
}

/// Offset flag: whether the order opens or reduces a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffsetFlag {
    Open,
    Close,
    ForceClose,
    CloseToday,
    CloseYesterday,
    ForceOff,
    LocalForceClose,
}

impl OffsetFlag {
    pub fn code(&self) -> char {
        match self {
            OffsetFlag::Open => '0',
            OffsetFlag::Close => '1',
            OffsetFlag::ForceClose => '2',
            OffsetFlag::CloseToday => '3',
            OffsetFlag::CloseYesterday => '4',
            OffsetFlag::ForceOff => '5',
            OffsetFlag::LocalForceClose => '6',
        }
    }
}

/// Hedge flag: venue-required classification of trading intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HedgeFlag {
    Speculation,
    Arbitrage,
    Hedge,
}

impl HedgeFlag {
    pub fn code(&self) -> char {
        match self {
            HedgeFlag::Speculation => '1',
            HedgeFlag::Arbitrage => '2',
            HedgeFlag::Hedge => '3',
        }
    }
}

/// Time condition (order validity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeCondition {
    /// Immediate or cancel
    Ioc,
    /// Good for this session
    Gfs,
    /// Good for the day
    Gfd,
    /// Good till date (see `gtd_date`)
    Gtd,
    /// Good till cancelled
    Gtc,
    /// Good for auction
    Gfa,
}

impl TimeCondition {
    pub fn code(&self) -> char {
        match self {
            TimeCondition::Ioc => '1',
            TimeCondition::Gfs => '2',
            TimeCondition::Gfd => '3',
            TimeCondition::Gtd => '4',
            TimeCondition::Gtc => '5',
            TimeCondition::Gfa => '6',
        }
    }
}

/// Volume condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeCondition {
    Any,
    Minimum,
    All,
}

impl VolumeCondition {
    pub fn code(&self) -> char {
        match self {
            VolumeCondition::Any => '1',
            VolumeCondition::Minimum => '2',
            VolumeCondition::All => '3',
        }
    }
}

/// Contingent (trigger) condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContingentCondition {
    Immediately,
    Touch,
    TouchProfit,
    ParkedOrder,
    LastPriceGreaterThanStopPrice,
    LastPriceGreaterEqualStopPrice,
    LastPriceLesserThanStopPrice,
    LastPriceLesserEqualStopPrice,
    AskPriceGreaterThanStopPrice,
    AskPriceGreaterEqualStopPrice,
    AskPriceLesserThanStopPrice,
    AskPriceLesserEqualStopPrice,
    BidPriceGreaterThanStopPrice,
    BidPriceGreaterEqualStopPrice,
    BidPriceLesserThanStopPrice,
    BidPriceLesserEqualStopPrice,
}

impl ContingentCondition {
    pub fn code(&self) -> char {
        match self {
            ContingentCondition::Immediately => '1',
            ContingentCondition::Touch => '2',
            ContingentCondition::TouchProfit => '3',
            ContingentCondition::ParkedOrder => '4',
            ContingentCondition::LastPriceGreaterThanStopPrice => '5',
            ContingentCondition::LastPriceGreaterEqualStopPrice => '6',
            ContingentCondition::LastPriceLesserThanStopPrice => '7',
            ContingentCondition::LastPriceLesserEqualStopPrice => '8',
            ContingentCondition::AskPriceGreaterThanStopPrice => '9',
            ContingentCondition::AskPriceGreaterEqualStopPrice => 'A',
            ContingentCondition::AskPriceLesserThanStopPrice => 'B',
            ContingentCondition::AskPriceLesserEqualStopPrice => 'C',
            ContingentCondition::BidPriceGreaterThanStopPrice => 'D',
            ContingentCondition::BidPriceGreaterEqualStopPrice => 'E',
            ContingentCondition::BidPriceLesserThanStopPrice => 'F',
            // 'G' is unassigned by the venue
            ContingentCondition::BidPriceLesserEqualStopPrice => 'H',
        }
    }
}

/// Force-close reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceCloseReason {
    NotForceClose,
    LackDeposit,
    ClientOverPositionLimit,
    MemberOverPositionLimit,
    NotMultiple,
    Violation,
    Other,
    PersonDeliv,
}

impl ForceCloseReason {
    pub fn code(&self) -> char {
        match self {
            ForceCloseReason::NotForceClose => '0',
            ForceCloseReason::LackDeposit => '1',
            ForceCloseReason::ClientOverPositionLimit => '2',
            ForceCloseReason::MemberOverPositionLimit => '3',
            ForceCloseReason::NotMultiple => '4',
            ForceCloseReason::Violation => '5',
            ForceCloseReason::Other => '6',
            ForceCloseReason::PersonDeliv => '7',
        }
    }
}

/// Settlement acknowledgement request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfirm {
    pub broker_id: String,
    pub investor_id: String,
}

/// Gateway input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputOrder {
    pub broker_id: String,
    pub investor_id: String,
    pub user_id: String,
    pub instrument: Instrument,
    pub order_ref: String,
    pub price_type: PriceType,
    pub direction: Direction,
    pub offset: OffsetFlag,
    pub hedge: HedgeFlag,
    pub limit_price: Price,
    pub volume: u32,
    pub time_condition: TimeCondition,
    /// YYYYMMDD, only meaningful with [`TimeCondition::Gtd`]
    pub gtd_date: String,
    pub volume_condition: VolumeCondition,
    pub min_volume: u32,
    pub contingent_condition: ContingentCondition,
    pub stop_price: Price,
    pub force_close_reason: ForceCloseReason,
    pub is_auto_suspend: bool,
    pub business_unit: String,
    pub request_id: i32,
    pub user_force_close: bool,
    pub is_swap_order: bool,
}

impl InputOrder {
    /// Market order: any price, immediate-or-cancel, any volume, speculation.
    /// The minimum volume defaults to the requested volume.
    pub fn market(
        broker_id: impl Into<String>,
        investor_id: impl Into<String>,
        instrument: Instrument,
        order_ref: impl Into<String>,
        direction: Direction,
        offset: OffsetFlag,
        volume: u32,
    ) -> Self {
        let investor_id = investor_id.into();
        Self {
            broker_id: broker_id.into(),
            user_id: investor_id.clone(),
            investor_id,
            instrument,
            order_ref: order_ref.into(),
            price_type: PriceType::AnyPrice,
            direction,
            offset,
            hedge: HedgeFlag::Speculation,
            limit_price: Price::ZERO,
            volume,
            time_condition: TimeCondition::Ioc,
            gtd_date: String::new(),
            volume_condition: VolumeCondition::Any,
            min_volume: volume,
            contingent_condition: ContingentCondition::Immediately,
            stop_price: Price::ZERO,
            force_close_reason: ForceCloseReason::NotForceClose,
            is_auto_suspend: false,
            business_unit: String::new(),
            request_id: 1,
            user_force_close: false,
            is_swap_order: false,
        }
    }

    pub fn with_request_id(mut self, request_id: i32) -> Self {
        self.request_id = request_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_order_defaults() {
        let order = InputOrder::market(
            "9999",
            "000001",
            Instrument::new("rb2410"),
            "000000000007",
            Direction::Sell,
            OffsetFlag::Close,
            3,
        );

        assert_eq!(order.user_id, "000001");
        assert_eq!(order.price_type.code(), '1');
        assert_eq!(direction_code(order.direction), '1');
        assert_eq!(order.offset.code(), '1');
        assert_eq!(order.hedge.code(), '1');
        assert_eq!(order.time_condition.code(), '1');
        assert_eq!(order.volume_condition.code(), '1');
        assert_eq!(order.contingent_condition.code(), '1');
        assert_eq!(order.force_close_reason.code(), '0');
        assert_eq!(order.min_volume, 3);
        assert!(order.limit_price.is_zero());
    }

    #[test]
    fn test_codes_skip_letter_g() {
        assert_eq!(ContingentCondition::BidPriceLesserThanStopPrice.code(), 'F');
        assert_eq!(ContingentCondition::BidPriceLesserEqualStopPrice.code(), 'H');
        assert_eq!(PriceType::BidPrice1PlusThreeTicks.code(), 'F');
    }
}
