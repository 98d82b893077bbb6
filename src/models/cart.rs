use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ClientError;

/// One product/variant selection in a shopper's cart, as returned by `GET /cart`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub cart_product_id: u64,
    pub product_id: u64,
    pub merchant_id: u64,
    pub merchant_name: String,
    pub variant_combination_product_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub variant: String,
    /// Quantity in the cart
    pub amount: u32,
    pub weight: f64,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u64,
    pub city_id: u64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::optional_decimal"
    )]
    pub cutted_price: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::optional_decimal"
    )]
    pub cut_price: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::optional_decimal"
    )]
    pub discount: Option<Decimal>,
}

impl CartLineItem {
    /// Rejects values the backend should never send but the wire format cannot exclude.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.price.is_sign_negative() {
            return Err(ClientError::Validation(format!(
                "cart product {} has negative price {}",
                self.cart_product_id, self.price
            )));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ClientError::Validation(format!(
                "cart product {} has invalid weight {}",
                self.cart_product_id, self.weight
            )));
        }
        if self.price.checked_mul(Decimal::from(self.amount)).is_none() {
            return Err(ClientError::Validation(format!(
                "cart product {} costs more than can be represented ({} x {})",
                self.cart_product_id, self.price, self.amount
            )));
        }
        Ok(())
    }

    /// `trunc(price × amount)`: the merchant subtotal contribution of this line.
    ///
    /// Saturates at `Decimal::MAX` instead of overflowing.
    pub fn line_cost(&self) -> Decimal {
        self.price
            .saturating_mul(Decimal::from(self.amount))
            .trunc()
    }
}

/// Cart contents as held by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub id: u64,
    #[serde(default, deserialize_with = "super::optional_decimal")]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub products: Vec<CartLineItem>,
}

impl CartSnapshot {
    pub fn validate(&self) -> Result<(), ClientError> {
        self.products.iter().try_for_each(CartLineItem::validate)
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Body of `POST /cart`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AddToCartRequest {
    pub variant_combination_product_id: u64,
    /// Quantity to add; the backend names this field `stock`
    pub stock: u32,
}

/// Body of the quantity endpoints (`PUT /cart/update`, `POST /cart/add`, `DELETE /cart/delete`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartQuantityRequest {
    pub cart_product_id: u64,
    pub quantity: u32,
}

/// Body of `DELETE /cart`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemoveCartItemRequest {
    pub cart_product_id: u64,
}
