use serde::{Deserialize, Serialize};

/// Voucher the shopper can apply at checkout (`GET /checkout/promos`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promo {
    pub id: u64,
    pub name: String,
}
