//! Order and position lifecycle
//!
//! [`Trader`] turns open/close requests into order records, drives them
//! through the [`Session`], and records the outcome. The gateway decides
//! whether anything was filled; local state only follows its answer.
//!
//! - `open` creates at most one order and one position
//! - `close` never touches a position that isn't open, and a failed close
//!   leaves the position open so it can be retried
//! - nothing is retried implicitly

pub mod batch;
pub mod query;

pub use batch::{CloseAllReport, CloseAllSummary, CloseFailure};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::gateway::{OffsetFlag, TradingGateway};
use crate::order_ref::OrderRefError;
use crate::session::{Execution, Rejection, Session};
use crate::store::{NewOrder, NewPosition, Position, Scope, StoreError, TradingStore};
use crate::types::{Direction, Instrument, OrderAction, OrderId, PositionId};

/// Result code for a direction other than buy/sell
pub const UNKNOWN_DIRECTION_CODE: i32 = -3000;
/// Result code for a close on a position id that doesn't exist
pub const POSITION_NOT_FOUND_CODE: i32 = -3001;
/// Result code for a close on a position that isn't open
pub const POSITION_NOT_OPEN_CODE: i32 = -3002;
/// Result code for an explicit zero volume
pub const INVALID_VOLUME_CODE: i32 = -3003;
/// Result code for a close while another close of the position is in flight
pub const CLOSE_IN_FLIGHT_CODE: i32 = -3004;
/// Result code for an open beyond the direction's position limit
pub const POSITION_LIMIT_CODE: i32 = -3005;
/// Result code for store and order reference failures
pub const INTERNAL_ERROR_CODE: i32 = -3099;

/// Who the trader acts for, and the order defaults that come with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub task_id: Option<i64>,
    pub strategy_executer_id: Option<i64>,
    pub simulate: bool,
    /// Lots per order when the caller gives none
    pub default_volume: u32,
    pub max_buy_positions: Option<u32>,
    pub max_sell_positions: Option<u32>,
}

impl ExecutionContext {
    pub fn new(default_volume: u32) -> Self {
        Self {
            task_id: None,
            strategy_executer_id: None,
            simulate: false,
            default_volume,
            max_buy_positions: None,
            max_sell_positions: None,
        }
    }

    pub fn scope(&self) -> Scope {
        Scope {
            task_id: self.task_id,
            strategy_executer_id: self.strategy_executer_id,
        }
    }

    pub fn position_limit(&self, direction: Direction) -> Option<u32> {
        match direction {
            Direction::Buy => self.max_buy_positions,
            Direction::Sell => self.max_sell_positions,
        }
    }
}

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("unknown position direction: {0:?}")]
    UnknownDirection(String),

    #[error("order volume must be at least 1")]
    InvalidVolume,

    #[error("position {0} does not exist")]
    PositionNotFound(PositionId),

    #[error("position {0} is not open")]
    PositionNotOpen(PositionId),

    #[error("position {position_id} already has close order {order_id} in flight")]
    CloseInFlight {
        position_id: PositionId,
        order_id: OrderId,
    },

    #[error("{direction} position limit of {limit} reached")]
    PositionLimitReached { direction: Direction, limit: u32 },

    #[error("gateway rejected order ({error_id}): {message}")]
    GatewayRejected { error_id: i32, message: String },

    #[error(transparent)]
    OrderRef(#[from] OrderRefError),

    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl TradeError {
    /// Numeric result code; gateway rejections keep the gateway's error id
    pub fn code(&self) -> i32 {
        match self {
            TradeError::UnknownDirection(_) => UNKNOWN_DIRECTION_CODE,
            TradeError::InvalidVolume => INVALID_VOLUME_CODE,
            TradeError::PositionNotFound(_) => POSITION_NOT_FOUND_CODE,
            TradeError::PositionNotOpen(_) => POSITION_NOT_OPEN_CODE,
            TradeError::CloseInFlight { .. } => CLOSE_IN_FLIGHT_CODE,
            TradeError::PositionLimitReached { .. } => POSITION_LIMIT_CODE,
            TradeError::GatewayRejected { error_id, .. } => *error_id,
            TradeError::OrderRef(_) | TradeError::Store(_) => INTERNAL_ERROR_CODE,
        }
    }
}

impl From<StoreError> for TradeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PositionNotFound(id) => TradeError::PositionNotFound(id),
            StoreError::PositionNotOpen(id) => TradeError::PositionNotOpen(id),
            StoreError::CloseInFlight {
                position_id,
                order_id,
            } => TradeError::CloseInFlight {
                position_id,
                order_id,
            },
            StoreError::OrderRef(e) => TradeError::OrderRef(e),
            other => TradeError::Store(other),
        }
    }
}

impl From<Rejection> for TradeError {
    fn from(rejection: Rejection) -> Self {
        TradeError::GatewayRejected {
            error_id: rejection.error_id,
            message: rejection.message,
        }
    }
}

pub type TradeResult<T> = Result<T, TradeError>;

/// Parse operator/strategy direction text: exactly `buy` or `sell`
pub fn parse_direction(text: &str) -> TradeResult<Direction> {
    text.parse()
        .map_err(|_| TradeError::UnknownDirection(text.to_string()))
}

/// Lifecycle manager for one account session
pub struct Trader<G, S> {
    session: Session<G>,
    store: S,
    context: ExecutionContext,
}

impl<G, S> Trader<G, S> {
    pub fn new(session: Session<G>, store: S, context: ExecutionContext) -> Self {
        Self {
            session,
            store,
            context,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn session(&self) -> &Session<G> {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<G: TradingGateway, S: TradingStore> Trader<G, S> {
    /// Open a position at market.
    ///
    /// `volume = None` uses the context's default volume. Returns the new
    /// position, or the gateway's rejection after the order was marked
    /// `error`.
    pub async fn open(
        &mut self,
        instrument: impl Into<Instrument>,
        direction: Direction,
        volume: Option<u32>,
    ) -> TradeResult<Position> {
        let instrument = instrument.into();
        let volume = match volume {
            Some(0) => return Err(TradeError::InvalidVolume),
            Some(volume) => volume,
            None => self.context.default_volume,
        };
        if volume == 0 {
            return Err(TradeError::InvalidVolume);
        }
        self.check_position_limit(direction)?;

        let order = self.store.create_order(&NewOrder {
            scope: self.context.scope(),
            simulate: self.context.simulate,
            instrument: instrument.clone(),
            action: OrderAction::Open,
            direction,
            volume,
            position_id: None,
            insert_time: Utc::now(),
        })?;

        info!(
            "📤 Open {} {} x{} (order {}, ref {})",
            instrument, direction, volume, order.id, order.order_ref
        );

        let request = self.session.market_order(
            instrument.clone(),
            &order.order_ref,
            direction,
            OffsetFlag::Open,
            volume,
        );
        let execution = match self.session.submit(&request).await {
            Ok(execution) => execution,
            Err(rejection) => return Err(self.reject(order.id, rejection)),
        };

        let price = execution.price();
        let now = Utc::now();
        let (_, position) = self
            .store
            .record_open_fill(
                order.id,
                &NewPosition {
                    scope: self.context.scope(),
                    simulate: self.context.simulate,
                    instrument,
                    direction,
                    volume,
                    open_time: now,
                    open_price: price,
                },
                now,
            )
            .map_err(|e| unrecorded_fill(order.id, &execution, e))?;

        info!(
            "✅ Opened position {}: {} {} x{} @ {}",
            position.id, position.instrument, position.direction, position.volume, price
        );
        Ok(position)
    }

    /// Close a whole position at market with an opposite-direction order
    pub async fn close(&mut self, position_id: PositionId) -> TradeResult<Position> {
        let position = self
            .store
            .get_position(position_id)?
            .ok_or(TradeError::PositionNotFound(position_id))?;
        if !position.is_open() {
            return Err(TradeError::PositionNotOpen(position_id));
        }

        let order = self.store.create_close_order(&NewOrder {
            scope: self.context.scope(),
            simulate: self.context.simulate,
            instrument: position.instrument.clone(),
            action: OrderAction::Close,
            direction: position.direction,
            volume: position.volume,
            position_id: Some(position.id),
            insert_time: Utc::now(),
        })?;

        info!(
            "📤 Close position {}: {} {} x{} (order {}, ref {})",
            position.id,
            position.instrument,
            position.direction,
            position.volume,
            order.id,
            order.order_ref
        );

        let request = self.session.market_order(
            position.instrument.clone(),
            &order.order_ref,
            position.direction.opposite(),
            OffsetFlag::Close,
            position.volume,
        );
        let execution = match self.session.submit(&request).await {
            Ok(execution) => execution,
            Err(rejection) => return Err(self.reject(order.id, rejection)),
        };

        let price = execution.price();
        let (_, closed) = self
            .store
            .record_close_fill(order.id, position.id, price, Utc::now())
            .map_err(|e| unrecorded_fill(order.id, &execution, e))?;

        info!(
            "✅ Closed position {} @ {} (opened @ {})",
            closed.id, price, closed.open_price
        );
        Ok(closed)
    }

    fn check_position_limit(&self, direction: Direction) -> TradeResult<()> {
        let Some(limit) = self.context.position_limit(direction) else {
            return Ok(());
        };
        let open = self.count_open(direction)?;
        if open >= limit as usize {
            warn!(
                "{} position limit reached: {} open, limit {}",
                direction, open, limit
            );
            return Err(TradeError::PositionLimitReached { direction, limit });
        }
        Ok(())
    }

    /// Mark the order `error` and turn the rejection into the caller's error
    fn reject(&self, order_id: OrderId, rejection: Rejection) -> TradeError {
        warn!(
            "❌ Order {} rejected ({}): {}",
            order_id, rejection.error_id, rejection.message
        );
        if let Err(e) =
            self.store
                .record_rejection(order_id, rejection.error_id, &rejection.message, Utc::now())
        {
            error!("Failed to record rejection of order {}: {}", order_id, e);
            return e.into();
        }
        rejection.into()
    }
}

fn unrecorded_fill(order_id: OrderId, execution: &Execution, err: StoreError) -> TradeError {
    // The venue filled but local state did not follow; the order stays in `insert`
    error!(
        "Order {} filled @ {} but the fill was not recorded: {}",
        order_id,
        execution.price(),
        err
    );
    err.into()
}
