use futures::future::join_all;
use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::cart_aggregator::MerchantGroup;
use crate::{
    config::ClientConfig,
    errors::ClientError,
    models::{
        courier::{CourierCostRequest, CourierCostResponse},
        CourierQuote,
    },
};

const COST_PATH: &str = "/cost";
pub const NO_SERVICE_MESSAGE: &str = "There is no service between these cities";

/// Looks up shipping costs for a merchant's parcel from the rate provider.
///
/// Every configured courier is asked at once; couriers that fail or have no
/// service between the two cities are left out of the answer.
#[derive(Clone)]
pub struct CourierRateService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    couriers: Vec<String>,
}

impl std::fmt::Debug for CourierRateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierRateService")
            .field("base_url", &self.base_url)
            .field("couriers", &self.couriers)
            .finish_non_exhaustive()
    }
}

impl CourierRateService {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Url::parse(config.courier_rates_url()).map_err(|e| {
            ClientError::Config(format!(
                "invalid courier rates URL {}: {}",
                config.courier_rates_url(),
                e
            ))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.courier_rates_url().to_string(),
            api_key: config.courier_api_key.clone(),
            couriers: config.couriers.clone(),
        })
    }

    pub fn couriers(&self) -> &[String] {
        &self.couriers
    }

    /// Asks one courier for the cost of shipping `weight_grams` between two cities.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CourierQuote))` - the courier's first service and its cost
    /// * `Ok(None)` - the courier does not serve this route
    /// * `Err(ClientError)` - the provider rejected the lookup or could not be reached
    #[instrument(skip(self))]
    pub async fn quote(
        &self,
        courier: &str,
        origin: u64,
        destination: u64,
        weight_grams: u64,
    ) -> Result<Option<CourierQuote>, ClientError> {
        let form = CourierCostRequest {
            key: self.api_key.as_deref(),
            origin,
            destination,
            weight: weight_grams,
            courier,
        };

        let response = self
            .http
            .post(format!("{}{}", self.base_url, COST_PATH))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let parsed = serde_json::from_slice::<CourierCostResponse>(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.rajaongkir.status)
                .map(|s| s.description)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string());
            return Err(ClientError::Remote { status, message });
        }

        let parsed = parsed.map_err(|e| {
            ClientError::MalformedResponse(format!("courier cost response: {}", e))
        })?;
        let quote = parsed.first_quote(courier);

        if let Some(quote) = &quote {
            if quote.cost.is_sign_negative() {
                return Err(ClientError::MalformedResponse(format!(
                    "negative cost {} from courier {}",
                    quote.cost, courier
                )));
            }
        }
        Ok(quote)
    }

    /// Quotes every configured courier for shipping `group` to `destination`.
    ///
    /// The parcel leaves from the merchant's city and weighs the group's
    /// total weight, rounded up to whole grams.
    ///
    /// # Errors
    ///
    /// `Remote` with 404 when no courier returned a quote.
    #[instrument(skip(self, group), fields(merchant_id = group.merchant_id, origin = group.city_id))]
    pub async fn quotes_for(
        &self,
        group: &MerchantGroup,
        destination: u64,
    ) -> Result<Vec<CourierQuote>, ClientError> {
        let weight = shipping_weight(group.total_weight);
        let lookups = self
            .couriers
            .iter()
            .map(|courier| self.quote(courier, group.city_id, destination, weight));

        let quotes: Vec<CourierQuote> = join_all(lookups)
            .await
            .into_iter()
            .zip(&self.couriers)
            .filter_map(|(result, courier)| match result {
                Ok(Some(quote)) => Some(quote),
                Ok(None) => {
                    debug!(%courier, "courier has no service on this route");
                    None
                }
                Err(err) => {
                    warn!(%courier, error = %err, "courier rate lookup failed");
                    None
                }
            })
            .collect();

        if quotes.is_empty() {
            return Err(ClientError::Remote {
                status: StatusCode::NOT_FOUND,
                message: NO_SERVICE_MESSAGE.to_string(),
            });
        }

        info!(quotes = quotes.len(), "Courier rates fetched");
        Ok(quotes)
    }
}

/// Grams sent to the rate provider: rounded up, never below one.
pub fn shipping_weight(total_weight: f64) -> u64 {
    if total_weight.is_finite() && total_weight > 1.0 {
        total_weight.ceil() as u64
    } else {
        1
    }
}

/// Picks `preferred` when it was quoted, otherwise the cheapest quote.
/// `None` when `preferred` names a courier that was not quoted.
pub fn choose_quote<'a>(
    quotes: &'a [CourierQuote],
    preferred: Option<&str>,
) -> Option<&'a CourierQuote> {
    match preferred {
        Some(courier) => quotes.iter().find(|quote| quote.courier == courier),
        None => quotes.iter().min_by_key(|quote| quote.cost),
    }
}
