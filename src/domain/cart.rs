//! Cart lines and total computation.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// A cart item joined to its live product row. Cart totals always use the
/// *current* product price; only orders freeze prices (into `order_items`).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub cart_item_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Checkout precondition: an empty cart is a domain error, not a crash.
pub fn ensure_not_empty(lines: &[CartLine]) -> Result<()> {
    if lines.is_empty() {
        return Err(StoreError::InvalidState("your cart is empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(price: Decimal, quantity: i32) -> CartLine {
        CartLine {
            cart_item_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Oxford Shirt".to_string(),
            unit_price: price,
            quantity,
        }
    }

    #[test]
    fn total_sums_quantity_times_price() {
        let lines = vec![line(dec!(10.00), 2), line(dec!(5.00), 1)];
        assert_eq!(cart_total(&lines), dec!(25.00));
    }

    #[test]
    fn empty_cart_totals_zero_and_fails_checkout() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
        assert!(matches!(ensure_not_empty(&[]), Err(StoreError::InvalidState(_))));
        assert!(ensure_not_empty(&[line(dec!(1), 1)]).is_ok());
    }
}
