//! Order Domain Models
//!
//! Order snapshot, the status state machine and checkout inputs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cart::CartLine;

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order, also used as the delivery-tracking stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    AwaitingAcceptance,
    PharmacyAccepted,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Forward stages, in order. `Cancelled` sits outside the progression.
    pub const PROGRESSION: [OrderStatus; 5] = [
        OrderStatus::AwaitingAcceptance,
        OrderStatus::PharmacyAccepted,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Position in [`Self::PROGRESSION`], `None` for `Cancelled`.
    pub fn stage_index(self) -> Option<usize> {
        Self::PROGRESSION.iter().position(|s| *s == self)
    }

    /// The immediate next forward stage.
    pub fn next(self) -> Option<OrderStatus> {
        self.stage_index()
            .and_then(|i| Self::PROGRESSION.get(i + 1))
            .copied()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Allowed edges: stay put, move one stage forward, or cancel a
    /// non-terminal order.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        if self == to {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        to == OrderStatus::Cancelled || self.next() == Some(to)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::AwaitingAcceptance => "awaiting_acceptance",
            OrderStatus::PharmacyAccepted => "pharmacy_accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Payment options offered at checkout. Payment itself is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Pix,
    Boleto,
    Cash,
}

/// Everything besides the cart that an order is built from
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub payment_method: PaymentMethod,
    pub address: String,
    pub delivery_fee: Decimal,
}

// =============================================================================
// Order
// =============================================================================

/// Customer feedback left once an order has been delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub pharmacy_rating: u8,
    pub delivery_rating: u8,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Snapshot of a completed checkout.
///
/// Fields are read-only outside this module; only the order book mutates the
/// status related fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub(crate) id: String,
    pub(crate) items: Vec<CartLine>,
    pub(crate) subtotal: Decimal,
    pub(crate) delivery_fee: Decimal,
    pub(crate) total: Decimal,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) delivery_address: String,
    pub(crate) status: OrderStatus,
    pub(crate) is_active: bool,
    pub(crate) version: u64,
    #[serde(skip)]
    pub(crate) delivery_code: String,
    pub(crate) review: Option<Review>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Order {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn review(&self) -> Option<&Review> {
        self.review.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Code the customer reads to the courier. Only revealed once the order
    /// has left the pharmacy.
    pub fn delivery_code(&self) -> Option<&str> {
        match self.status {
            OrderStatus::OutForDelivery | OrderStatus::Delivered => Some(&self.delivery_code),
            _ => None,
        }
    }
}

// =============================================================================
// REST Inputs / Responses
// =============================================================================

/// Input for `POST /checkout`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub payment_method: PaymentMethod,
    pub address: String,
    /// Falls back to the configured default fee
    pub delivery_fee: Option<Decimal>,
}

/// Input for `PATCH /orders/:id/status`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusInput {
    pub status: OrderStatus,
    pub expected_version: Option<u64>,
}

/// Input for `POST /orders/:id/review`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub pharmacy_rating: u8,
    pub delivery_rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Query string of `GET /orders`
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub active: bool,
}

/// Order as sent to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub delivery_code: Option<String>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let delivery_code = order.delivery_code().map(str::to_string);
        Self {
            order,
            delivery_code,
        }
    }
}
