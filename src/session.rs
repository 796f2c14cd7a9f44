//! Gateway session
//!
//! A session is only handed out after the venue accepted the settlement
//! acknowledgement, so every `Session` value is ready to submit orders.
//! Each round trip is bounded by the configured timeout; a timeout or a
//! transport failure is reported as a rejection, never as success.

use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::Account;
use crate::gateway::{
    Fill, GatewayError, GatewayReply, InputOrder, OffsetFlag, SettlementConfirm, TradingGateway,
};
use crate::types::{Direction, Instrument, Price};

/// Reserved error id: the gateway did not answer within the timeout
pub const GATEWAY_TIMEOUT_ERROR_ID: i32 = -4001;
/// Reserved error id: the request never reached the gateway or the answer was lost
pub const GATEWAY_TRANSPORT_ERROR_ID: i32 = -4002;
/// Reserved error id: the gateway accepted the order but reported no fill
pub const GATEWAY_NO_FILL_ERROR_ID: i32 = -4003;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("settlement confirmation rejected ({error_id}): {message}")]
    SettlementRejected { error_id: i32, message: String },

    #[error("settlement confirmation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("settlement confirmation failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Accepted order with at least one fill
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    fills: Vec<Fill>,
}

impl Execution {
    /// Execution price: the first fill's price
    pub fn price(&self) -> Price {
        self.fills[0].price
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }
}

/// Order not accepted, for whatever reason
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("gateway rejected order ({error_id}): {message}")]
pub struct Rejection {
    pub error_id: i32,
    pub message: String,
}

impl Rejection {
    pub fn new(error_id: i32, message: impl Into<String>) -> Self {
        Self {
            error_id,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub request_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl SessionOptions {
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// One authenticated, settlement-confirmed gateway connection
pub struct Session<G> {
    gateway: G,
    broker_id: String,
    investor_id: String,
    options: SessionOptions,
    next_request_id: AtomicI32,
}

impl<G: TradingGateway> Session<G> {
    /// Confirm settlement and hand out a usable session
    pub async fn connect(
        account: &Account,
        gateway: G,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let request = SettlementConfirm {
            broker_id: account.broker_id.clone(),
            investor_id: account.user_id.clone(),
        };

        let reply = timeout(options.request_timeout, gateway.confirm_settlement(&request))
            .await
            .map_err(|_| SessionError::TimedOut(options.request_timeout))??;

        if !reply.is_accepted() {
            warn!(
                "Settlement confirmation rejected for {}: ({}) {}",
                account.user_id, reply.error_id, reply.error_msg
            );
            return Err(SessionError::SettlementRejected {
                error_id: reply.error_id,
                message: reply.error_msg,
            });
        }

        info!(
            "Session ready: account={} broker={} investor={}",
            account.name, account.broker_id, account.user_id
        );

        Ok(Self {
            gateway,
            broker_id: account.broker_id.clone(),
            investor_id: account.user_id.clone(),
            options,
            next_request_id: AtomicI32::new(1),
        })
    }

    /// Build a market order for this session's broker/investor
    pub fn market_order(
        &self,
        instrument: Instrument,
        order_ref: &str,
        direction: Direction,
        offset: OffsetFlag,
        volume: u32,
    ) -> InputOrder {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        InputOrder::market(
            self.broker_id.as_str(),
            self.investor_id.as_str(),
            instrument,
            order_ref,
            direction,
            offset,
            volume,
        )
        .with_request_id(request_id)
    }

    /// Submit one order and wait for the answer. No retry.
    pub async fn submit(&self, order: &InputOrder) -> Result<Execution, Rejection> {
        let reply = match timeout(self.options.request_timeout, self.gateway.insert_order(order)).await {
            Err(_) => {
                return Err(Rejection::new(
                    GATEWAY_TIMEOUT_ERROR_ID,
                    format!("gateway did not answer within {:?}", self.options.request_timeout),
                ))
            }
            Ok(Err(e)) => return Err(Rejection::new(GATEWAY_TRANSPORT_ERROR_ID, e.to_string())),
            Ok(Ok(reply)) => reply,
        };

        interpret(reply)
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

fn interpret(reply: GatewayReply) -> Result<Execution, Rejection> {
    if !reply.is_accepted() {
        return Err(Rejection::new(reply.error_id, reply.error_msg));
    }
    if reply.fills.is_empty() {
        return Err(Rejection::new(
            GATEWAY_NO_FILL_ERROR_ID,
            "gateway accepted the order without a fill",
        ));
    }
    Ok(Execution { fills: reply.fills })
}
