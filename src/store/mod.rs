//! Order and position records
//!
//! Plain records plus the repository interface the trader persists through.
//! Every multi-record step is one store call so an implementation can make
//! it atomic; nothing is written as a side effect of touching a field.

pub mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order_ref::OrderRefError;
use crate::types::{
    Direction, Instrument, OrderAction, OrderId, OrderState, PositionId, PositionState, Price,
    PriceCondition,
};

/// Execution-context filter keys. `None` means "don't filter on this key".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scope {
    pub task_id: Option<i64>,
    pub strategy_executer_id: Option<i64>,
}

/// Order request record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub task_id: Option<i64>,
    pub strategy_executer_id: Option<i64>,
    pub simulate: bool,
    pub instrument: Instrument,
    pub action: OrderAction,
    pub direction: Direction,
    pub volume: u32,
    /// Requested price while in flight (zero = market), fill price once finished
    pub price: Price,
    pub price_condition: PriceCondition,
    pub insert_time: DateTime<Utc>,
    pub finish_time: Option<DateTime<Utc>>,
    pub state: OrderState,
    pub error_id: i32,
    pub error_msg: String,
    pub order_ref: String,
    /// Position closed by this order, or created by it for a finished open
    pub position_id: Option<PositionId>,
}

/// Fields of an order about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub scope: Scope,
    pub simulate: bool,
    pub instrument: Instrument,
    pub action: OrderAction,
    pub direction: Direction,
    pub volume: u32,
    pub position_id: Option<PositionId>,
    pub insert_time: DateTime<Utc>,
}

/// Position record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub task_id: Option<i64>,
    pub strategy_executer_id: Option<i64>,
    pub simulate: bool,
    pub instrument: Instrument,
    pub direction: Direction,
    pub volume: u32,
    pub open_time: DateTime<Utc>,
    pub open_price: Price,
    pub close_price: Option<Price>,
    pub close_time: Option<DateTime<Utc>>,
    pub state: PositionState,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.state == PositionState::Open
    }
}

/// Fields of a position created by a filled open order
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub scope: Scope,
    pub simulate: bool,
    pub instrument: Instrument,
    pub direction: Direction,
    pub volume: u32,
    pub open_time: DateTime<Utc>,
    pub open_price: Price,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionFilter {
    pub scope: Scope,
    pub state: Option<PositionState>,
    /// Empty list means no instrument filter
    pub instruments: Option<Vec<Instrument>>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub scope: Scope,
    pub state: Option<OrderState>,
    pub position_id: Option<PositionId>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare state directory: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    OrderRef(#[from] OrderRefError),

    #[error("order {0} does not exist")]
    OrderNotFound(OrderId),

    #[error("order {order_id} is already {state:?}")]
    OrderNotInFlight { order_id: OrderId, state: OrderState },

    #[error("position {0} does not exist")]
    PositionNotFound(PositionId),

    #[error("position {0} is not open")]
    PositionNotOpen(PositionId),

    #[error("position {position_id} already has close order {order_id} in flight")]
    CloseInFlight {
        position_id: PositionId,
        order_id: OrderId,
    },

    #[error("close order is missing its position reference")]
    MissingPositionReference,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository for order and position records.
///
/// Order transitions only apply to orders still in `insert`; position
/// transitions only apply to positions still `open`.
pub trait TradingStore: Send + Sync {
    /// Insert an order, then derive and persist its reference, atomically
    fn create_order(&self, order: &NewOrder) -> StoreResult<Order>;

    /// Like [`create_order`](Self::create_order), but only if the referenced
    /// position is open and has no close order in flight
    fn create_close_order(&self, order: &NewOrder) -> StoreResult<Order>;

    /// Create the position and finish its open order at the fill price
    fn record_open_fill(
        &self,
        order_id: OrderId,
        position: &NewPosition,
        finish_time: DateTime<Utc>,
    ) -> StoreResult<(Order, Position)>;

    /// Close the position and finish the close order at the fill price
    fn record_close_fill(
        &self,
        order_id: OrderId,
        position_id: PositionId,
        price: Price,
        finish_time: DateTime<Utc>,
    ) -> StoreResult<(Order, Position)>;

    /// Move an in-flight order to `error`
    fn record_rejection(
        &self,
        order_id: OrderId,
        error_id: i32,
        error_msg: &str,
        finish_time: DateTime<Utc>,
    ) -> StoreResult<Order>;

    fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    fn get_position(&self, id: PositionId) -> StoreResult<Option<Position>>;

    /// Matching positions, oldest open time first
    fn find_positions(&self, filter: &PositionFilter) -> StoreResult<Vec<Position>>;

    /// Matching orders in insertion order
    fn find_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;
}
