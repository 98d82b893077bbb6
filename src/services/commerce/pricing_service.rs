use crate::{
    client::{ApiRequest, TokenizedClient},
    errors::ClientError,
    models::{PriceCheckRequest, PriceCheckResult, Promo},
};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

const CHECK_PRICE_PATH: &str = "/checkout/check-price";
const PROMOS_PATH: &str = "/checkout/promos";

/// Asks the backend for authoritative checkout totals and remembers the last answer.
///
/// Once a price check has succeeded its totals take precedence over the
/// cart's local estimate. A failed check never disturbs the stored result.
#[derive(Debug)]
pub struct PriceChecker {
    client: TokenizedClient,
    last_result: RwLock<Option<PriceCheckResult>>,
}

impl PriceChecker {
    pub fn new(client: TokenizedClient) -> Self {
        Self {
            client,
            last_result: RwLock::new(None),
        }
    }

    /// Submits the current courier selections for pricing.
    ///
    /// # Arguments
    ///
    /// * `request` - Cart, address, optional voucher and one courier per merchant
    ///
    /// # Returns
    ///
    /// * `Ok(PriceCheckResult)` - the new totals, also stored as the latest result
    /// * `Err(ClientError)` - the previous result is kept as it was
    #[instrument(
        skip(self, request),
        fields(cart_id = request.cart_id, merchants = request.merchant.len())
    )]
    pub async fn check_price(
        &self,
        request: &PriceCheckRequest,
    ) -> Result<PriceCheckResult, ClientError> {
        match self.fetch_price(request).await {
            Ok(result) => {
                info!(total_price = %result.total_price, "Price check succeeded");
                *self.last_result.write().await = Some(result.clone());
                Ok(result)
            }
            Err(err) => {
                warn!(error = %err, "Price check failed; keeping previous result");
                Err(err)
            }
        }
    }

    async fn fetch_price(
        &self,
        request: &PriceCheckRequest,
    ) -> Result<PriceCheckResult, ClientError> {
        let request = ApiRequest::post(CHECK_PRICE_PATH).json(request)?;
        self.client.request(&request).await?.into_data()
    }

    /// The most recent successful price check, if any.
    pub async fn last_result(&self) -> Option<PriceCheckResult> {
        self.last_result.read().await.clone()
    }

    /// Forgets the stored result, e.g. after the cart changed.
    pub async fn clear(&self) {
        *self.last_result.write().await = None;
    }

    /// Lists vouchers available to the shopper.
    #[instrument(skip(self))]
    pub async fn promos(&self) -> Result<Vec<Promo>, ClientError> {
        let promos: Option<Vec<Promo>> = self
            .client
            .request(&ApiRequest::get(PROMOS_PATH))
            .await?
            .data;
        Ok(promos.unwrap_or_default())
    }
}
