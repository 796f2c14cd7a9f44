//! Futures Trader
//!
//! Order and position lifecycle management against a CTP-style futures
//! trading gateway: settlement-confirmed sessions, order references derived
//! from persisted order ids, open/close with local position tracking, scoped
//! position queries, and batch close-all with partial-failure accounting.

pub mod config;
pub mod gateway;
pub mod order_ref;
pub mod session;
pub mod store;
pub mod trader;
pub mod types;

pub use config::Config;
pub use session::{Session, SessionError, SessionOptions};
pub use store::{Order, Position, SqliteStore, TradingStore};
pub use trader::{CloseAllReport, ExecutionContext, TradeError, Trader};
pub use types::*;
