// ============================================================================
// Cart Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },

    #[error("Invalid cart line: {0}")]
    InvalidLine(String),

    #[error("Amount for {product_id} is out of range")]
    AmountOutOfRange { product_id: String },
}
