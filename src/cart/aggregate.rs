use rust_decimal::Decimal;
use serde::Serialize;

use super::errors::CartError;
use super::helpers::{checked_total, format_item_summary, merge_line};
use super::models::CartLine;

// ============================================================================
// Cart Aggregate
// ============================================================================

/// Items the session intends to purchase, in the order they were first added.
///
/// There is no stored total: [`Cart::total`] is recomputed from the lines on
/// every call. Mutations that would push the total out of `Decimal` range are
/// rejected before anything changes, so a stored cart always has a total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn get(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == product_id)
    }

    /// Number of distinct lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities over all lines
    pub fn item_count(&self) -> u64 {
        self.lines.iter().fold(0, |acc, l| acc + u64::from(l.quantity))
    }

    /// Σ unit_price × quantity over the current lines.
    pub fn total(&self) -> Result<Decimal, CartError> {
        checked_total(&self.lines)
    }

    pub fn summary(&self) -> String {
        format_item_summary(&self.lines)
    }

    /// Adds `line.quantity` units of the product (at least one).
    ///
    /// An existing line for the same product id is incremented, otherwise the
    /// line is appended. The cart is unchanged when the merged quantity or the
    /// resulting total is out of range.
    pub fn add(&mut self, line: CartLine) -> Result<(), CartError> {
        let mut lines = self.lines.clone();
        merge_line(&mut lines, line)?;
        checked_total(&lines)?;

        self.lines = lines;
        Ok(())
    }

    /// Removes the whole line. Returns `false` when the product was not in the cart.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != product_id);
        self.lines.len() != before
    }

    /// Takes one unit off the line, dropping it once it reaches zero.
    pub fn decrement(&mut self, product_id: &str) {
        let Some(pos) = self.lines.iter().position(|l| l.id == product_id) else {
            return;
        };

        if self.lines[pos].quantity > 1 {
            self.lines[pos].quantity -= 1;
        } else {
            self.lines.remove(pos);
        }
    }

    /// Sets the quantity of a line; zero or negative removes it.
    ///
    /// Unknown product ids are ignored.
    pub fn update_quantity(&mut self, product_id: &str, new_qty: i64) -> Result<(), CartError> {
        if new_qty <= 0 {
            self.remove(product_id);
            return Ok(());
        }

        let quantity = u32::try_from(new_qty).map_err(|_| CartError::InvalidQuantity {
            product_id: product_id.to_string(),
            quantity: new_qty,
        })?;

        let Some(pos) = self.lines.iter().position(|l| l.id == product_id) else {
            return Ok(());
        };

        let mut lines = self.lines.clone();
        lines[pos].quantity = quantity;
        checked_total(&lines)?;

        self.lines = lines;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p1() -> CartLine {
        CartLine::new("p1", "Dipirona 500mg", Decimal::new(1500, 2), 1)
    }

    fn p2() -> CartLine {
        CartLine::new("p2", "Vitamina C", Decimal::new(5500, 2), 1)
    }

    fn expected_total(cart: &Cart) -> Decimal {
        cart.lines()
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum()
    }

    fn cart_of(lines: impl IntoIterator<Item = CartLine>) -> Cart {
        let mut cart = Cart::new();
        for line in lines {
            cart.add(line).unwrap();
        }
        cart
    }

    #[test]
    fn test_add_same_product_twice_aggregates() {
        let mut cart = Cart::new();
        cart.add(p1()).unwrap();
        cart.add(p1()).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("p1").unwrap().quantity, 2);
        assert_eq!(cart.total().unwrap(), Decimal::new(3000, 2));
    }

    #[test]
    fn test_add_with_explicit_quantity() {
        let mut cart = Cart::new();
        cart.add(CartLine::new("p1", "Dipirona 500mg", Decimal::new(1500, 2), 3))
            .unwrap();

        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total().unwrap(), Decimal::new(4500, 2));
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(p1()).unwrap();
        cart.update_quantity("p1", 0).unwrap();

        assert!(cart.get("p1").is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_negative_removes_line() {
        let mut cart = Cart::new();
        cart.add(p1()).unwrap();
        cart.update_quantity("p1", -4).unwrap();

        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut cart = Cart::new();
        cart.add(p1()).unwrap();
        cart.update_quantity("p1", 7).unwrap();

        assert_eq!(cart.get("p1").unwrap().quantity, 7);
        assert_eq!(cart.total().unwrap(), Decimal::new(10500, 2));
    }

    #[test]
    fn test_update_quantity_rejects_out_of_range() {
        let mut cart = Cart::new();
        cart.add(p1()).unwrap();
        let err = cart.update_quantity("p1", i64::from(u32::MAX) + 1).unwrap_err();

        assert!(matches!(err, CartError::InvalidQuantity { .. }));
        assert_eq!(cart.get("p1").unwrap().quantity, 1);
    }

    #[test]
    fn test_update_quantity_unknown_product_is_noop() {
        let mut cart = Cart::new();
        cart.add(p1()).unwrap();
        cart.update_quantity("missing", 3).unwrap();

        assert_eq!(cart.len(), 1);
        assert!(cart.get("missing").is_none());
    }

    #[test]
    fn test_add_then_remove_restores_line_count() {
        let mut cart = Cart::new();
        cart.add(p1()).unwrap();
        let before = cart.len();

        cart.add(p2()).unwrap();
        assert!(cart.remove("p2"));
        assert_eq!(cart.len(), before);

        cart.add(p2()).unwrap();
        cart.update_quantity("p2", 0).unwrap();
        assert_eq!(cart.len(), before);
    }

    #[test]
    fn test_remove_is_outright_and_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(CartLine::new("p1", "Dipirona 500mg", Decimal::new(1500, 2), 5))
            .unwrap();

        assert!(cart.remove("p1"));
        assert!(cart.is_empty());
        assert!(!cart.remove("p1"));
    }

    #[test]
    fn test_decrement_drops_line_at_zero() {
        let mut cart = Cart::new();
        cart.add(CartLine::new("p1", "Dipirona 500mg", Decimal::new(1500, 2), 2))
            .unwrap();

        cart.decrement("p1");
        assert_eq!(cart.get("p1").unwrap().quantity, 1);

        cart.decrement("p1");
        assert!(cart.get("p1").is_none());

        cart.decrement("p1");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let mut cart = Cart::new();
        cart.add(p1()).unwrap();
        assert_eq!(cart.total().unwrap(), expected_total(&cart));
        cart.add(p2()).unwrap();
        assert_eq!(cart.total().unwrap(), expected_total(&cart));
        cart.add(p1()).unwrap();
        assert_eq!(cart.total().unwrap(), expected_total(&cart));
        cart.update_quantity("p2", 4).unwrap();
        assert_eq!(cart.total().unwrap(), expected_total(&cart));
        cart.decrement("p1");
        assert_eq!(cart.total().unwrap(), expected_total(&cart));
        cart.remove("p2");
        assert_eq!(cart.total().unwrap(), expected_total(&cart));
        assert_eq!(cart.total().unwrap(), Decimal::new(1500, 2));
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add(p1()).unwrap();
        cart.add(p2()).unwrap();
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.add(p2()).unwrap();
        cart.add(p1()).unwrap();
        cart.add(p2()).unwrap();

        let ids: Vec<_> = cart.lines().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["p2", "p1"]);
        assert_eq!(cart.summary(), "2x Vitamina C, 1x Dipirona 500mg");
    }

    #[test]
    fn test_add_rejects_line_total_out_of_range() {
        let mut cart = cart_of([p1()]);
        let before = cart.clone();

        let huge = CartLine::new("big", "Huge", Decimal::MAX, 2);
        assert_eq!(
            cart.add(huge).unwrap_err(),
            CartError::AmountOutOfRange {
                product_id: "big".into()
            }
        );
        assert_eq!(cart, before);
        assert_eq!(cart.total().unwrap(), Decimal::new(1500, 2));
    }

    #[test]
    fn test_add_rejects_cart_total_out_of_range() {
        let mut cart = cart_of([CartLine::new("a", "A", Decimal::MAX, 1)]);
        let before = cart.clone();

        assert!(cart.add(CartLine::new("b", "B", Decimal::MAX, 1)).is_err());
        assert!(cart.add(CartLine::new("a", "A", Decimal::MAX, 1)).is_err());
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_rejects_total_out_of_range() {
        let mut cart = cart_of([CartLine::new("a", "A", Decimal::MAX, 1)]);

        let err = cart.update_quantity("a", 2).unwrap_err();
        assert!(matches!(err, CartError::AmountOutOfRange { .. }));
        assert_eq!(cart.get("a").unwrap().quantity, 1);
    }

    #[test]
    fn test_add_rejects_quantity_past_u32_max() {
        let mut cart = cart_of([CartLine::new("a", "A", Decimal::ONE, u32::MAX)]);

        let err = cart.add(CartLine::new("a", "A", Decimal::ONE, 1)).unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity { .. }));
        assert_eq!(cart.get("a").unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_item_count_spans_past_u32_max() {
        let cart = cart_of([
            CartLine::new("a", "A", Decimal::ONE, u32::MAX),
            CartLine::new("b", "B", Decimal::ONE, 1),
        ]);

        assert_eq!(cart.item_count(), u64::from(u32::MAX) + 1);
        assert_eq!(cart.total().unwrap(), Decimal::from(u64::from(u32::MAX) + 1));
    }
}
