use super::models::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Cannot create an order from an empty cart")]
    EmptyCart,

    #[error("Invalid checkout: {0}")]
    InvalidCheckout(String),

    #[error("Invalid review: {0}")]
    InvalidReview(String),

    #[error("Order {0} not found")]
    NotFound(String),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },
}

impl OrderError {
    /// Precondition violations the caller can fix by changing its input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::EmptyCart | OrderError::InvalidCheckout(_) | OrderError::InvalidReview(_)
        )
    }
}
