//! Wire types exchanged with the marketplace backend.
//!
//! Every type here is deserialized straight from a response body, so a
//! payload that does not match surfaces as a
//! [`ClientError::MalformedResponse`](crate::errors::ClientError::MalformedResponse)
//! rather than as a partially filled value.

pub mod cart;
pub mod checkout;
pub mod courier;
pub mod promotion;

pub use cart::{CartLineItem, CartSnapshot};
pub use checkout::{
    CheckoutRequest, MerchantCourierSelection, MerchantPriceBreakdown, PriceCheckRequest,
    PriceCheckResult, ProductPriceBreakdown,
};
pub use courier::CourierQuote;
pub use promotion::Promo;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// The backend omits optional amounts or sends them as `""`; both read as `None`.
pub(crate) fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(Decimal),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
