//! Manual stock adjustments

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest shelf count a medicine may hold; stored as a 32-bit signed integer
pub const MAX_STOCK: u32 = i32::MAX as u32;

/// How a manual stock adjustment is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    /// Replace the stock count
    Set,
    /// Add to the stock count
    Add,
    /// Remove from the stock count, stopping at zero
    Subtract,
}

impl StockOperation {
    /// Applies the operation to `current`
    ///
    /// Returns `None` when the result would exceed [`MAX_STOCK`].
    pub fn apply(&self, current: u32, quantity: u32) -> Option<u32> {
        let stock = match self {
            StockOperation::Set => quantity,
            StockOperation::Add => current.checked_add(quantity)?,
            StockOperation::Subtract => current.saturating_sub(quantity),
        };
        (stock <= MAX_STOCK).then_some(stock)
    }
}

impl fmt::Display for StockOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StockOperation::Set => "set",
            StockOperation::Add => "add",
            StockOperation::Subtract => "subtract",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations() {
        assert_eq!(StockOperation::Set.apply(40, 7), Some(7));
        assert_eq!(StockOperation::Add.apply(40, 7), Some(47));
        assert_eq!(StockOperation::Subtract.apply(40, 7), Some(33));
    }

    #[test]
    fn test_subtract_clamps_at_zero() {
        assert_eq!(StockOperation::Subtract.apply(3, 10), Some(0));
    }

    #[test]
    fn test_results_past_max_stock_are_refused() {
        assert_eq!(StockOperation::Add.apply(MAX_STOCK, 0), Some(MAX_STOCK));
        assert_eq!(StockOperation::Add.apply(MAX_STOCK, 1), None);
        assert_eq!(StockOperation::Add.apply(u32::MAX, 1), None);
        assert_eq!(StockOperation::Set.apply(0, MAX_STOCK + 1), None);
    }
}
