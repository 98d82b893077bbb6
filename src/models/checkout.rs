use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Courier chosen for one merchant's parcel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantCourierSelection {
    pub merchant_id: u64,
    pub courier_id: String,
    /// Serialized as a decimal string
    pub courier_price: Decimal,
}

/// Body of `POST /checkout/check-price`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCheckRequest {
    pub cart_id: u64,
    pub address_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_id: Option<u64>,
    pub merchant: Vec<MerchantCourierSelection>,
}

/// The checkout submission carries the same selections as a price check.
pub type CheckoutRequest = PriceCheckRequest;

/// Authoritative totals returned by the pricing endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceCheckResult {
    pub total_price: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::optional_decimal"
    )]
    pub discount: Option<Decimal>,
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
    pub cutted_price: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::optional_decimal"
    )]
    pub initial_price: Option<Decimal>,
    #[serde(default)]
    pub merchant: Vec<MerchantPriceBreakdown>,
}

impl PriceCheckResult {
    pub fn merchant(&self, merchant_id: u64) -> Option<&MerchantPriceBreakdown> {
        self.merchant.iter().find(|m| m.merchant_id == merchant_id)
    }

    /// True when a voucher reduced the order total.
    pub fn has_discount(&self) -> bool {
        self.discount.is_some_and(|d| !d.is_zero())
    }
}

/// Per-merchant slice of a [`PriceCheckResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MerchantPriceBreakdown {
    pub merchant_id: u64,
    #[serde(default)]
    pub merchant_name: String,
    pub total_price: Decimal,
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
    pub cutted_price: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::optional_decimal"
    )]
    pub discount: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::optional_decimal"
    )]
    pub initial_price: Option<Decimal>,
    /// Shipping cost for this merchant's parcel
    #[serde(default, deserialize_with = "super::optional_decimal")]
    pub ongkir: Option<Decimal>,
    #[serde(rename = "CheckPriceProducts", default)]
    pub products: Vec<ProductPriceBreakdown>,
}

/// Per-product slice of a [`MerchantPriceBreakdown`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductPriceBreakdown {
    pub product_id: u64,
    #[serde(default)]
    pub product_name: String,
    pub total_price: Decimal,
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
    pub discount: Option<Decimal>,
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
    pub initial_price: Option<Decimal>,
}
