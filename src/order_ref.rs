//! Order correlation references
//!
//! The gateway matches submissions to acknowledgements by a fixed-width
//! numeric string. We derive it from the store-assigned order id, so the id
//! must be durable before the reference is computed.

use thiserror::Error;

use crate::types::OrderId;

/// Width of the gateway's order reference field
pub const ORDER_REF_WIDTH: usize = 12;

/// Largest id that fits in [`ORDER_REF_WIDTH`] decimal digits
pub const MAX_ORDER_REF_ID: OrderId = 999_999_999_999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderRefError {
    #[error("order id {0} is negative and has no order reference")]
    Negative(OrderId),

    #[error("order id {0} does not fit in 12 digits")]
    Overflow(OrderId),
}

/// Map an order id to its gateway correlation reference.
///
/// ```
/// use futures_trader::order_ref::reference;
/// assert_eq!(reference(1).unwrap(), "000000000001");
/// ```
pub fn reference(id: OrderId) -> Result<String, OrderRefError> {
    if id < 0 {
        return Err(OrderRefError::Negative(id));
    }
    if id > MAX_ORDER_REF_ID {
        return Err(OrderRefError::Overflow(id));
    }
    Ok(format!("{:0width$}", id, width = ORDER_REF_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_is_zero_padded() {
        assert_eq!(reference(0).unwrap(), "000000000000");
        assert_eq!(reference(42).unwrap(), "000000000042");
        assert_eq!(reference(MAX_ORDER_REF_ID).unwrap(), "999999999999");
    }

    #[test]
    fn test_reference_width_is_fixed() {
        for id in [1, 9, 10, 12345, 1_000_000, 123_456_789_012] {
            assert_eq!(reference(id).unwrap().len(), ORDER_REF_WIDTH);
        }
    }

    #[test]
    fn test_reference_is_injective() {
        let ids = (0..2_000).chain(MAX_ORDER_REF_ID - 2_000..=MAX_ORDER_REF_ID);
        let refs: HashSet<String> = ids.clone().map(|id| reference(id).unwrap()).collect();
        assert_eq!(refs.len(), ids.count());
    }

    #[test]
    fn test_reference_out_of_range() {
        assert_eq!(
            reference(MAX_ORDER_REF_ID + 1),
            Err(OrderRefError::Overflow(MAX_ORDER_REF_ID + 1))
        );
        assert_eq!(reference(-1), Err(OrderRefError::Negative(-1)));
    }
}
