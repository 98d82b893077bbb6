use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One courier's price for shipping a merchant's parcel to the shopper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CourierQuote {
    /// Courier code as sent to the rate provider (`jne`, `pos`, ...); used as the courier id at checkout.
    pub courier: String,
    /// Provider's name for the service level, e.g. `REG`.
    pub service: String,
    pub cost: Decimal,
    /// Estimated days in transit as the provider reports it (`"2-3"`).
    #[serde(default)]
    pub etd: Option<String>,
}

/// Form body of a rate lookup (`POST {courier_rates_url}/cost`).
#[derive(Debug, Serialize)]
pub(crate) struct CourierCostRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<&'a str>,
    pub origin: u64,
    pub destination: u64,
    pub weight: u64,
    pub courier: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourierCostResponse {
    pub rajaongkir: CourierCostPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourierCostPayload {
    #[serde(default)]
    pub status: Option<ProviderStatus>,
    #[serde(default)]
    pub results: Vec<CourierCostResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderStatus {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourierCostResult {
    pub code: String,
    #[serde(default)]
    pub costs: Vec<CourierServiceCost>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourierServiceCost {
    pub service: String,
    #[serde(default)]
    pub cost: Vec<CourierCostValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourierCostValue {
    pub value: Decimal,
    #[serde(default)]
    pub etd: Option<String>,
}

impl CourierCostResponse {
    /// First service of the first result, which is the one the storefront offers.
    /// `None` when the provider knows no service between the two cities.
    pub(crate) fn first_quote(self, courier: &str) -> Option<CourierQuote> {
        let result = self.rajaongkir.results.into_iter().next()?;
        let service = result.costs.into_iter().next()?;
        let value = service.cost.into_iter().next()?;

        let code = if result.code.is_empty() {
            courier.to_string()
        } else {
            result.code
        };

        Some(CourierQuote {
            courier: code,
            service: service.service,
            cost: value.value,
            etd: value.etd.filter(|etd| !etd.is_empty()),
        })
    }
}
