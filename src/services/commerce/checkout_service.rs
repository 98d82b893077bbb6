use crate::{
    client::{ApiRequest, TokenizedClient},
    errors::ClientError,
    models::CheckoutRequest,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

const WALLET_AUTH_PATH: &str = "/wallet/auth";
const CHECKOUT_PATH: &str = "/checkout";

#[derive(Serialize)]
struct WalletAuthRequest<'a> {
    pin: &'a str,
}

/// Places orders paid from the shopper's wallet.
///
/// Checkout is a two-step exchange: the wallet PIN buys a short-lived
/// checkout token, which then authorizes the order itself. The checkout call
/// uses that token instead of the session token and is never retried.
#[derive(Clone, Debug)]
pub struct CheckoutService {
    client: TokenizedClient,
}

impl CheckoutService {
    pub fn new(client: TokenizedClient) -> Self {
        Self { client }
    }

    /// Exchanges the wallet PIN for a checkout token.
    #[instrument(skip(self, pin))]
    pub async fn authorize_wallet(&self, pin: &str) -> Result<String, ClientError> {
        if pin.trim().is_empty() {
            return Err(ClientError::Validation("wallet PIN is required".into()));
        }

        let request = ApiRequest::post(WALLET_AUTH_PATH).json(&WalletAuthRequest { pin })?;
        let token: String = self.client.request(&request).await?.into_data()?;

        info!("Wallet authorized for checkout");
        Ok(token)
    }

    /// Places the order described by `request`.
    ///
    /// # Arguments
    ///
    /// * `request` - Same selections that were last price-checked
    /// * `checkout_token` - Token from [`authorize_wallet`](Self::authorize_wallet)
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - the backend's order payload, passed through untouched
    /// * `Err(ClientError)` - including `Remote` with 401 when the token expired
    #[instrument(skip(self, request, checkout_token), fields(cart_id = request.cart_id))]
    pub async fn checkout(
        &self,
        request: &CheckoutRequest,
        checkout_token: &str,
    ) -> Result<Value, ClientError> {
        if request.merchant.is_empty() {
            return Err(ClientError::Validation(
                "checkout needs at least one merchant".into(),
            ));
        }

        let order = ApiRequest::post(CHECKOUT_PATH).json(request)?;
        let envelope = self
            .client
            .request_with_bearer::<Value>(&order, checkout_token)
            .await?;

        info!(cart_id = request.cart_id, "Order placed");
        Ok(envelope.data.unwrap_or(Value::Null))
    }
}
