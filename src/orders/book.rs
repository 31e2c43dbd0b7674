use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::errors::OrderError;
use super::models::{CheckoutDetails, Order, OrderStatus, Review};
use crate::cart::Cart;

/// Length of the customer-facing order id
const ORDER_ID_LEN: usize = 8;

// ============================================================================
// Order Book
// ============================================================================

/// All orders placed in a session, most recent first.
///
/// Orders are never deleted; cancellation only flips the status and the
/// `is_active` flag.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn active_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_active)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Snapshots `cart` into a new order and returns its id.
    ///
    /// The cart is left untouched; clearing it is up to the caller once the
    /// order exists.
    pub fn create_order_from_cart(
        &mut self,
        cart: &Cart,
        details: CheckoutDetails,
    ) -> Result<String, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        let address = details.address.trim();
        if address.is_empty() {
            return Err(OrderError::InvalidCheckout(
                "delivery address is required".into(),
            ));
        }
        if details.delivery_fee < Decimal::ZERO {
            return Err(OrderError::InvalidCheckout(format!(
                "delivery fee cannot be negative ({})",
                details.delivery_fee
            )));
        }

        let subtotal = cart
            .total()
            .map_err(|e| OrderError::InvalidCheckout(e.to_string()))?;
        let Some(total) = subtotal.checked_add(details.delivery_fee) else {
            return Err(OrderError::InvalidCheckout(
                "order total is out of range".into(),
            ));
        };

        let now = Utc::now();
        let order = Order {
            id: self.generate_unique_id(),
            items: cart.lines().to_vec(),
            subtotal,
            delivery_fee: details.delivery_fee,
            total,
            payment_method: details.payment_method,
            delivery_address: address.to_string(),
            status: OrderStatus::AwaitingAcceptance,
            is_active: true,
            version: 1,
            delivery_code: generate_delivery_code(),
            review: None,
            created_at: now,
            updated_at: now,
        };

        tracing::info!(
            order_id = %order.id,
            items = %cart.summary(),
            total = %order.total,
            "Order created"
        );

        let id = order.id.clone();
        self.orders.insert(0, order);
        Ok(id)
    }

    pub fn get_order_by_id(&self, id: &str) -> Result<&Order, OrderError> {
        self.orders
            .iter()
            .find(|o| o.id == id)
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Order, OrderError> {
        self.orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    /// Moves the order to `new_status` if the edge is allowed.
    pub fn update_order_status(
        &mut self,
        id: &str,
        new_status: OrderStatus,
    ) -> Result<&Order, OrderError> {
        let order = self.get_mut(id)?;
        apply_transition(order, new_status)?;
        Ok(&*order)
    }

    /// Like [`Self::update_order_status`], but only if nobody changed the
    /// order since `expected_version` was read.
    pub fn update_order_status_if(
        &mut self,
        id: &str,
        new_status: OrderStatus,
        expected_version: u64,
    ) -> Result<&Order, OrderError> {
        let order = self.get_mut(id)?;
        if order.version != expected_version {
            return Err(OrderError::VersionConflict {
                expected: expected_version,
                actual: order.version,
            });
        }
        apply_transition(order, new_status)?;
        Ok(&*order)
    }

    /// Walks the order forward, one legal transition per stage, until it
    /// reaches `target`. Used by trackers, which may report a later stage
    /// than the next one.
    ///
    /// Fails without touching the order when `target` lies behind the
    /// current status or the order is terminal.
    pub fn advance_order_to(
        &mut self,
        id: &str,
        target: OrderStatus,
    ) -> Result<&Order, OrderError> {
        let order = self.get_mut(id)?;
        let reachable = match (order.status.stage_index(), target.stage_index()) {
            (Some(from), Some(to)) => from <= to,
            _ => order.status.can_transition_to(target),
        };
        if !reachable {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }

        while order.status != target {
            let next = match order.status.next() {
                Some(next) if target != OrderStatus::Cancelled => next,
                _ => target,
            };
            apply_transition(order, next)?;
        }
        Ok(&*order)
    }

    pub fn cancel_order(&mut self, id: &str) -> Result<&Order, OrderError> {
        self.update_order_status(id, OrderStatus::Cancelled)
    }

    /// Attaches the post-delivery review. Accepted once, on delivered orders.
    pub fn submit_review(
        &mut self,
        id: &str,
        pharmacy_rating: u8,
        delivery_rating: u8,
        comment: Option<String>,
    ) -> Result<&Order, OrderError> {
        for rating in [pharmacy_rating, delivery_rating] {
            if !(1..=5).contains(&rating) {
                return Err(OrderError::InvalidReview(format!(
                    "ratings go from 1 to 5, got {rating}"
                )));
            }
        }

        let order = self.get_mut(id)?;
        if order.status != OrderStatus::Delivered {
            return Err(OrderError::InvalidReview(format!(
                "order {} has not been delivered yet",
                order.id
            )));
        }
        if order.review.is_some() {
            return Err(OrderError::InvalidReview(format!(
                "order {} was already reviewed",
                order.id
            )));
        }

        order.review = Some(Review {
            pharmacy_rating,
            delivery_rating,
            comment: comment.filter(|c| !c.trim().is_empty()),
            submitted_at: Utc::now(),
        });
        order.updated_at = Utc::now();
        Ok(&*order)
    }

    fn generate_unique_id(&self) -> String {
        loop {
            let id = new_order_id();
            if self.orders.iter().all(|o| o.id != id) {
                return id;
            }
            tracing::debug!(order_id = %id, "Order id collision, regenerating");
        }
    }
}

/// Checks the edge and bumps the version. A same-status update changes nothing.
fn apply_transition(order: &mut Order, new_status: OrderStatus) -> Result<(), OrderError> {
    if !order.status.can_transition_to(new_status) {
        return Err(OrderError::InvalidTransition {
            from: order.status,
            to: new_status,
        });
    }
    if order.status == new_status {
        return Ok(());
    }

    tracing::info!(
        order_id = %order.id,
        from = %order.status,
        to = %new_status,
        "Order status changed"
    );

    order.status = new_status;
    if new_status == OrderStatus::Cancelled {
        order.is_active = false;
    }
    order.version += 1;
    order.updated_at = Utc::now();
    Ok(())
}

fn new_order_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ORDER_ID_LEN);
    id.to_uppercase()
}

/// Four digits, never starting with zero.
fn generate_delivery_code() -> String {
    (Uuid::new_v4().as_u128() % 9000 + 1000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use crate::orders::models::PaymentMethod;

    fn cart_with_p1(quantity: u32) -> Cart {
        let mut cart = Cart::new();
        cart.add(CartLine::new(
            "p1",
            "Dipirona 500mg",
            Decimal::new(1500, 2),
            quantity,
        ))
        .unwrap();
        cart
    }

    fn details(fee: Decimal) -> CheckoutDetails {
        CheckoutDetails {
            payment_method: PaymentMethod::Pix,
            address: "Rua das Flores, 123 - Centro".into(),
            delivery_fee: fee,
        }
    }

    fn place_order(book: &mut OrderBook) -> String {
        book.create_order_from_cart(&cart_with_p1(1), details(Decimal::TEN))
            .unwrap()
    }

    fn advance_to(book: &mut OrderBook, id: &str, target: OrderStatus) {
        while book.get_order_by_id(id).unwrap().status() != target {
            let next = book.get_order_by_id(id).unwrap().status().next().unwrap();
            book.update_order_status(id, next).unwrap();
        }
    }

    #[test]
    fn test_create_order_from_cart_computes_totals() {
        let mut book = OrderBook::new();
        let cart = cart_with_p1(2);

        let id = book
            .create_order_from_cart(&cart, details(Decimal::new(1000, 2)))
            .unwrap();
        let order = book.get_order_by_id(&id).unwrap();

        assert_eq!(order.subtotal(), Decimal::new(3000, 2));
        assert_eq!(order.total(), Decimal::new(4000, 2));
        assert_eq!(order.total(), cart.total().unwrap() + order.delivery_fee());
        assert_eq!(order.status(), OrderStatus::AwaitingAcceptance);
        assert!(order.is_active());
        assert_eq!(order.version(), 1);
        assert_eq!(order.items(), cart.lines());
        assert_eq!(id.len(), ORDER_ID_LEN);
    }

    #[test]
    fn test_create_leaves_cart_untouched() {
        let mut book = OrderBook::new();
        let cart = cart_with_p1(2);
        let before = cart.clone();

        book.create_order_from_cart(&cart, details(Decimal::TEN)).unwrap();

        assert_eq!(cart, before);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_items_are_decoupled_from_live_cart() {
        let mut book = OrderBook::new();
        let mut cart = cart_with_p1(1);
        let id = book.create_order_from_cart(&cart, details(Decimal::TEN)).unwrap();

        cart.add(CartLine::new("p2", "Vitamina C", Decimal::new(5500, 2), 1))
            .unwrap();
        cart.clear();

        let order = book.get_order_by_id(&id).unwrap();
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.subtotal(), Decimal::new(1500, 2));
    }

    #[test]
    fn test_empty_cart_is_rejected_without_side_effects() {
        let mut book = OrderBook::new();

        let err = book
            .create_order_from_cart(&Cart::new(), details(Decimal::TEN))
            .unwrap_err();

        assert_eq!(err, OrderError::EmptyCart);
        assert!(err.is_validation());
        assert!(book.is_empty());
    }

    #[test]
    fn test_blank_address_and_negative_fee_are_rejected() {
        let mut book = OrderBook::new();
        let mut blank = details(Decimal::TEN);
        blank.address = "   ".into();

        assert!(matches!(
            book.create_order_from_cart(&cart_with_p1(1), blank),
            Err(OrderError::InvalidCheckout(_))
        ));
        assert!(matches!(
            book.create_order_from_cart(&cart_with_p1(1), details(Decimal::NEGATIVE_ONE)),
            Err(OrderError::InvalidCheckout(_))
        ));
        assert!(book.is_empty());
    }

    #[test]
    fn test_order_total_out_of_range_is_rejected() {
        let mut book = OrderBook::new();
        let mut cart = Cart::new();
        cart.add(CartLine::new("p1", "Huge", Decimal::MAX, 1)).unwrap();

        let err = book
            .create_order_from_cart(&cart, details(Decimal::ONE))
            .unwrap_err();

        assert!(matches!(err, OrderError::InvalidCheckout(_)));
        assert!(err.is_validation());
        assert!(book.is_empty());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_orders_are_most_recent_first_with_distinct_ids() {
        let mut book = OrderBook::new();
        let first = place_order(&mut book);
        let second = place_order(&mut book);

        assert_ne!(first, second);
        let ids: Vec<_> = book.orders().iter().map(|o| o.id().to_string()).collect();
        assert_eq!(ids, [second, first]);
    }

    #[test]
    fn test_many_orders_never_share_an_id() {
        let mut book = OrderBook::new();
        let mut ids: Vec<_> = (0..500).map(|_| place_order(&mut book)).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_get_unknown_order_is_not_found() {
        let book = OrderBook::new();
        assert_eq!(
            book.get_order_by_id("NOPE").unwrap_err(),
            OrderError::NotFound("NOPE".into())
        );
    }

    #[test]
    fn test_status_walks_forward_and_bumps_version() {
        let mut book = OrderBook::new();
        let id = place_order(&mut book);

        advance_to(&mut book, &id, OrderStatus::Delivered);

        let order = book.get_order_by_id(&id).unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.version(), 5);
        assert!(order.is_active());
    }

    #[test]
    fn test_same_status_update_is_noop() {
        let mut book = OrderBook::new();
        let id = place_order(&mut book);

        let order = book
            .update_order_status(&id, OrderStatus::AwaitingAcceptance)
            .unwrap();
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn test_skipping_stage_is_rejected() {
        let mut book = OrderBook::new();
        let id = place_order(&mut book);

        let err = book
            .update_order_status(&id, OrderStatus::OutForDelivery)
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::AwaitingAcceptance,
                to: OrderStatus::OutForDelivery,
            }
        );
    }

    #[test]
    fn test_terminal_orders_reject_other_states() {
        let mut book = OrderBook::new();
        let delivered = place_order(&mut book);
        advance_to(&mut book, &delivered, OrderStatus::Delivered);
        let cancelled = place_order(&mut book);
        book.cancel_order(&cancelled).unwrap();

        for id in [&delivered, &cancelled] {
            let current = book.get_order_by_id(id).unwrap().status();
            for to in OrderStatus::PROGRESSION.iter().chain([&OrderStatus::Cancelled]) {
                if *to == current {
                    continue;
                }
                assert!(matches!(
                    book.update_order_status(id, *to),
                    Err(OrderError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn test_advance_order_to_walks_every_stage() {
        let mut book = OrderBook::new();
        let id = place_order(&mut book);

        let order = book
            .advance_order_to(&id, OrderStatus::OutForDelivery)
            .unwrap();
        assert_eq!(order.status(), OrderStatus::OutForDelivery);
        assert_eq!(order.version(), 4);

        let order = book
            .advance_order_to(&id, OrderStatus::OutForDelivery)
            .unwrap();
        assert_eq!(order.version(), 4);
    }

    #[test]
    fn test_advance_order_to_never_goes_back() {
        let mut book = OrderBook::new();
        let id = place_order(&mut book);
        advance_to(&mut book, &id, OrderStatus::Preparing);

        assert!(matches!(
            book.advance_order_to(&id, OrderStatus::PharmacyAccepted),
            Err(OrderError::InvalidTransition { .. })
        ));

        book.cancel_order(&id).unwrap();
        assert!(matches!(
            book.advance_order_to(&id, OrderStatus::Delivered),
            Err(OrderError::InvalidTransition { .. })
        ));
        assert_eq!(book.get_order_by_id(&id).unwrap().version(), 4);
    }

    #[test]
    fn test_cancel_marks_inactive() {
        let mut book = OrderBook::new();
        let id = place_order(&mut book);
        let other = place_order(&mut book);

        let order = book.cancel_order(&id).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert!(!order.is_active());

        let active: Vec<_> = book.active_orders().map(|o| o.id()).collect();
        assert_eq!(active, [other.as_str()]);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let mut book = OrderBook::new();
        let id = place_order(&mut book);

        book.update_order_status_if(&id, OrderStatus::PharmacyAccepted, 1)
            .unwrap();
        let err = book
            .update_order_status_if(&id, OrderStatus::Preparing, 1)
            .unwrap_err();

        assert_eq!(
            err,
            OrderError::VersionConflict {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(
            book.get_order_by_id(&id).unwrap().status(),
            OrderStatus::PharmacyAccepted
        );
    }

    #[test]
    fn test_delivery_code_revealed_once_out_for_delivery() {
        let mut book = OrderBook::new();
        let id = place_order(&mut book);
        assert!(book.get_order_by_id(&id).unwrap().delivery_code().is_none());

        advance_to(&mut book, &id, OrderStatus::OutForDelivery);
        let code = book.get_order_by_id(&id).unwrap().delivery_code().unwrap();
        assert_eq!(code.len(), 4);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_review_rules() {
        let mut book = OrderBook::new();
        let id = place_order(&mut book);

        assert!(matches!(
            book.submit_review(&id, 5, 5, None),
            Err(OrderError::InvalidReview(_))
        ));

        advance_to(&mut book, &id, OrderStatus::Delivered);
        assert!(matches!(
            book.submit_review(&id, 0, 5, None),
            Err(OrderError::InvalidReview(_))
        ));

        let order = book
            .submit_review(&id, 4, 5, Some("Entrega rápida".into()))
            .unwrap();
        let review = order.review().unwrap();
        assert_eq!(review.pharmacy_rating, 4);
        assert_eq!(review.delivery_rating, 5);

        assert!(matches!(
            book.submit_review(&id, 3, 3, None),
            Err(OrderError::InvalidReview(_))
        ));
    }
}
