//! Core data types used across the trading system

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Store-assigned order identifier
pub type OrderId = i64;

/// Store-assigned position identifier
pub type PositionId = i64;

/// Error for textual enum values that don't name a known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Futures instrument code (e.g. "rb2410") using Arc<str> for cheap cloning
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument(#[serde(with = "arc_str_serde")] Arc<str>);

mod arc_str_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Arc::from(s.as_str()))
    }
}

impl Instrument {
    pub fn new(s: impl AsRef<str>) -> Self {
        Instrument(Arc::from(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Instrument {
    fn from(value: &str) -> Self {
        Instrument::new(value)
    }
}

/// Position direction: long (buy) or short (sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }

    /// Direction of the order that flattens a position held in this direction
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl FromStr for Direction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Direction::Buy),
            "sell" => Ok(Direction::Sell),
            _ => Err(ParseEnumError::new("direction", s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an order opens a new position or closes an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    Open,
    Close,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Open => "open",
            OrderAction::Close => "close",
        }
    }
}

impl FromStr for OrderAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(OrderAction::Open),
            "close" => Ok(OrderAction::Close),
            _ => Err(ParseEnumError::new("order action", s)),
        }
    }
}

/// Order state machine: `Insert -> Finish | Error`, both terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    /// Persisted and (about to be) submitted, no gateway answer yet
    Insert,
    /// Accepted and filled by the gateway
    Finish,
    /// Rejected by the gateway, or the round trip failed
    Error,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Insert => "insert",
            OrderState::Finish => "finish",
            OrderState::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderState::Insert)
    }
}

impl FromStr for OrderState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(OrderState::Insert),
            "finish" => Ok(OrderState::Finish),
            "error" => Ok(OrderState::Error),
            _ => Err(ParseEnumError::new("order state", s)),
        }
    }
}

/// Position state machine: `Open -> Close`, terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionState {
    Open,
    Close,
}

impl PositionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionState::Open => "open",
            PositionState::Close => "close",
        }
    }
}

impl FromStr for PositionState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(PositionState::Open),
            "close" | "closed" => Ok(PositionState::Close),
            _ => Err(ParseEnumError::new("position state", s)),
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price condition recorded on an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceCondition {
    /// Fill immediately at whatever the market gives
    Immediate,
}

impl PriceCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceCondition::Immediate => "immediate",
        }
    }
}

impl FromStr for PriceCondition {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(PriceCondition::Immediate),
            _ => Err(ParseEnumError::new("price condition", s)),
        }
    }
}

// ============================================================================
// Price Type - Precise Decimal Arithmetic for Execution Prices
// ============================================================================

/// Price type wrapping `rust_decimal::Decimal`.
///
/// Fill prices are reported by the gateway as doubles; converting once at the
/// edge keeps stored open/close prices exact when they are read back.
/// Zero means "market" when used as a requested price.
///
/// # Example
/// ```
/// use futures_trader::Price;
/// let price = Price::from_f64(3500.5);
/// assert_eq!(price.to_string(), "3500.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero value, also the "any price" marker
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Price(value)
    }

    /// Create from f64
    /// Note: NaN and infinities map to zero
    pub fn from_f64(value: f64) -> Self {
        Price(Decimal::try_from(value).unwrap_or_else(|_| {
            if value.is_nan() || value.is_infinite() {
                Decimal::ZERO
            } else {
                Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
            }
        }))
    }

    /// Convert to f64 for the gateway wire format
    pub fn to_f64(self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Price(value)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Price)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Stored as TEXT so the decimal survives the round trip exactly
impl ToSql for Price {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Price {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(_) => {
                let text = value.as_str()?;
                Price::from_str(text).map_err(|e| FromSqlError::Other(Box::new(e)))
            }
            ValueRef::Integer(i) => Ok(Price(Decimal::from(i))),
            ValueRef::Real(f) => Ok(Price::from_f64(f)),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_parse() {
        assert_eq!("buy".parse::<Direction>().unwrap(), Direction::Buy);
        assert_eq!("sell".parse::<Direction>().unwrap(), Direction::Sell);
        assert!("BUY".parse::<Direction>().is_err());
        assert!(" sell ".parse::<Direction>().is_err());

        let err = "hold".parse::<Direction>().unwrap_err();
        assert_eq!(err.kind, "direction");
        assert_eq!(err.value, "hold");
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Buy.opposite(), Direction::Sell);
        assert_eq!(Direction::Sell.opposite(), Direction::Buy);
    }

    #[test]
    fn test_state_round_trip_strings() {
        for state in [OrderState::Insert, OrderState::Finish, OrderState::Error] {
            assert_eq!(state.as_str().parse::<OrderState>().unwrap(), state);
        }
        assert!(OrderState::Finish.is_terminal());
        assert!(!OrderState::Insert.is_terminal());
        assert_eq!("closed".parse::<PositionState>().unwrap(), PositionState::Close);
    }

    #[test]
    fn test_price_from_f64_is_exact_for_ticks() {
        assert_eq!(Price::from_f64(3500.0), Price::new(dec!(3500)));
        assert_eq!(Price::from_f64(0.1).inner() + Price::from_f64(0.2).inner(), dec!(0.3));
        assert_eq!(Price::from_f64(f64::NAN), Price::ZERO);
    }

    #[test]
    fn test_price_serde_accepts_numbers_and_strings() {
        let from_number: Price = serde_json::from_str("3500.5").unwrap();
        let from_string: Price = serde_json::from_str("\"3500.5\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number, Price::new(dec!(3500.5)));
    }

    #[test]
    fn test_instrument_display() {
        let instrument = Instrument::new("rb2410");
        assert_eq!(instrument.to_string(), "rb2410");
        assert_eq!(instrument, Instrument::from("rb2410"));
    }
}
