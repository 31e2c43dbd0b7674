//! Cart Domain Models
//!
//! This module contains the data structures of the cart domain and the
//! request/response shapes the REST handlers exchange with clients.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::CartError;

// =============================================================================
// Cart Domain Models
// =============================================================================

/// Returns the default quantity (1) for cart lines
fn default_quantity() -> u32 {
    1
}

/// One product line in the active cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product identifier, unique within a cart
    pub id: String,

    /// Display name of the product
    pub name: String,

    /// Price of a single unit
    pub unit_price: Decimal,

    /// Number of units (always >= 1 while the line exists)
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Opaque image reference (usually a URL)
    #[serde(default)]
    pub image_ref: String,
}

impl CartLine {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity,
            image_ref: String::new(),
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = image_ref.into();
        self
    }

    /// Checks what the type alone cannot: a product id and a non-negative price.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.id.trim().is_empty() {
            return Err(CartError::InvalidLine("product id is required".into()));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(CartError::InvalidLine(format!(
                "price of {} cannot be negative",
                self.id
            )));
        }
        Ok(())
    }

    /// `unit_price * quantity`, or an error when the product does not fit a `Decimal`.
    pub fn line_total(&self) -> Result<Decimal, CartError> {
        let Some(total) = self.unit_price.checked_mul(Decimal::from(self.quantity)) else {
            return Err(CartError::AmountOutOfRange {
                product_id: self.id.clone(),
            });
        };
        Ok(total)
    }
}

/// Product as served by the pharmacy catalog backend.
///
/// Only `id`, `nome`, `preco` and `imagem_url` end up in the cart; the rest is
/// accepted so catalog payloads can be forwarded untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogProduct {
    pub id: serde_json::Value,
    pub nome: String,
    pub preco: Decimal,
    #[serde(default)]
    pub nome_farmacia: Option<String>,
    #[serde(default)]
    pub quantidade_estoque: Option<i64>,
    #[serde(default)]
    pub imagem_url: Option<String>,
}

impl CatalogProduct {
    /// Maps the catalog shape onto the `{id, name, price, image}` a cart line needs.
    pub fn into_cart_line(self, quantity: u32) -> CartLine {
        // Catalog ids are integers in the SQLite backend and strings in the
        // static dataset.
        let id = match self.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };

        CartLine {
            id,
            name: self.nome,
            unit_price: self.preco,
            quantity,
            image_ref: self.imagem_url.unwrap_or_default(),
        }
    }
}

// =============================================================================
// REST Inputs / Responses
// =============================================================================

/// Input for `POST /cart/products`
#[derive(Debug, Deserialize)]
pub struct AddCatalogProductInput {
    #[serde(flatten)]
    pub product: CatalogProduct,

    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Input for `PUT /cart/items/:id`
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityInput {
    pub quantity: i64,
}

/// Snapshot of a cart returned by every cart endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub session_id: String,
    pub items: Vec<CartLine>,
    pub item_count: u64,
    pub total: Decimal,
}
