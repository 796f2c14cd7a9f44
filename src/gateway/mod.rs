//! Trading gateway boundary
//!
//! The gateway is the venue-side system that accepts orders and reports
//! fills. This module only defines what crosses the boundary; framing and
//! connection management belong to the implementation:
//! - [`PaperGateway`]: simulated fills at configured reference prices
//! - [`BridgeGateway`]: JSON over HTTP to a bridge process that owns the
//!   native gateway connection

pub mod bridge;
pub mod paper;
pub mod types;

pub use bridge::BridgeGateway;
pub use paper::PaperGateway;
pub use types::*;

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

use crate::types::Price;

/// One execution report entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub price: Price,
    #[serde(default)]
    pub volume: u32,
}

/// Raw gateway answer: `error_id == 0` means accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayReply {
    pub error_id: i32,
    #[serde(default)]
    pub error_msg: String,
    #[serde(default)]
    pub fills: Vec<Fill>,
}

impl GatewayReply {
    pub fn accepted(fills: Vec<Fill>) -> Self {
        Self {
            error_id: 0,
            error_msg: String::new(),
            fills,
        }
    }

    pub fn rejected(error_id: i32, error_msg: impl Into<String>) -> Self {
        Self {
            error_id,
            error_msg: error_msg.into(),
            fills: Vec::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.error_id == 0
    }
}

/// Failures that prevent a gateway answer from being obtained at all
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway bridge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("gateway is not connected")]
    Disconnected,
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Synchronous-semantics gateway: one request, one awaited answer, no retry.
pub trait TradingGateway: Send + Sync {
    /// Mandatory per-session settlement acknowledgement
    fn confirm_settlement(
        &self,
        request: &SettlementConfirm,
    ) -> impl Future<Output = GatewayResult<GatewayReply>> + Send;

    /// Submit an order and wait for the gateway's answer
    fn insert_order(
        &self,
        order: &InputOrder,
    ) -> impl Future<Output = GatewayResult<GatewayReply>> + Send;
}
