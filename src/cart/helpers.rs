//! Cart Business Logic Helpers
//!
//! This module contains helper functions for cart line operations and formatting.

use rust_decimal::Decimal;

use super::errors::CartError;
use super::models::CartLine;

/// Merges `incoming` into `lines`, aggregating the quantity of an existing
/// line with the same product id or appending a brand new one.
///
/// # Behaviour
///
/// * A zero quantity on `incoming` counts as one unit.
/// * When the line already exists only its `quantity` changes; the name,
///   price and image recorded on first add are kept.
/// * A merged quantity past `u32::MAX` is rejected and `lines` is left as is.
pub fn merge_line(lines: &mut Vec<CartLine>, mut incoming: CartLine) -> Result<(), CartError> {
    let quantity = incoming.quantity.max(1);

    if let Some(existing) = lines.iter_mut().find(|l| l.id == incoming.id) {
        let Some(merged) = existing.quantity.checked_add(quantity) else {
            return Err(CartError::InvalidQuantity {
                product_id: existing.id.clone(),
                quantity: i64::from(existing.quantity) + i64::from(quantity),
            });
        };
        existing.quantity = merged;
    } else {
        incoming.quantity = quantity;
        lines.push(incoming);
    }

    Ok(())
}

/// Σ unit_price × quantity with overflow checks on every step.
pub fn checked_total(lines: &[CartLine]) -> Result<Decimal, CartError> {
    lines.iter().try_fold(Decimal::ZERO, |acc, line| {
        acc.checked_add(line.line_total()?)
            .ok_or_else(|| CartError::AmountOutOfRange {
                product_id: line.id.clone(),
            })
    })
}

/// Produces a human-readable one-line summary for a list of cart lines.
///
/// Example output: `"2x Dipirona 500mg, 1x Vitamina C"`.
pub fn format_item_summary(lines: &[CartLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{}x {}", l.quantity, l.name))
        .collect::<Vec<_>>()
        .join(", ")
}
