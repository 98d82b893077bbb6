use crate::{
    client::{ApiRequest, TokenizedClient},
    errors::ClientError,
    models::{
        cart::{AddToCartRequest, CartQuantityRequest, RemoveCartItemRequest},
        CartSnapshot,
    },
};
use serde_json::Value;
use tracing::{debug, info, instrument};

const CART_PATH: &str = "/cart";
const CART_UPDATE_PATH: &str = "/cart/update";
const CART_INCREASE_PATH: &str = "/cart/add";
const CART_DECREASE_PATH: &str = "/cart/delete";

/// Shopping cart operations against the marketplace backend.
///
/// The backend owns the cart; this service only relays mutations and
/// fetches snapshots. Callers re-fetch after a mutation to observe its effect,
/// and nothing orders overlapping fetches, so a slow response may land after
/// a newer one.
///
/// # Examples
///
/// ```ignore
/// use storefront_client::services::commerce::CartService;
///
/// let carts = CartService::new(client);
/// carts.update_quantity(42, 3).await?;
/// let cart = carts.fetch_cart().await?;
/// ```
#[derive(Clone, Debug)]
pub struct CartService {
    client: TokenizedClient,
}

impl CartService {
    pub fn new(client: TokenizedClient) -> Self {
        Self { client }
    }

    /// Fetches the current cart.
    ///
    /// # Returns
    ///
    /// * `Ok(CartSnapshot)` - the cart, with every line checked for a
    ///   non-negative price and a finite, non-negative weight
    /// * `Err(ClientError::Validation)` - a line carried an impossible price or weight
    /// * `Err(ClientError)` - transport, auth or backend failure
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<CartSnapshot, ClientError> {
        let cart: CartSnapshot = self
            .client
            .request(&ApiRequest::get(CART_PATH))
            .await?
            .into_data()?;

        cart.validate()?;
        debug!(cart_id = cart.id, items = cart.products.len(), "cart fetched");
        Ok(cart)
    }

    /// Adds `quantity` units of a product variant to the cart.
    ///
    /// # Arguments
    ///
    /// * `variant_combination_product_id` - The variant to add
    /// * `quantity` - Units to add; 0 is raised to 1
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        variant_combination_product_id: u64,
        quantity: u32,
    ) -> Result<(), ClientError> {
        let body = AddToCartRequest {
            variant_combination_product_id,
            stock: quantity.max(1),
        };
        self.mutate(ApiRequest::post(CART_PATH).json(&body)?).await?;

        info!(variant_combination_product_id, "Added item to cart");
        Ok(())
    }

    /// Sets the quantity of a cart line.
    ///
    /// A quantity of 0 is sent as 1; removing a line goes through [`remove_item`](Self::remove_item).
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        cart_product_id: u64,
        quantity: u32,
    ) -> Result<(), ClientError> {
        let body = CartQuantityRequest {
            cart_product_id,
            quantity: quantity.max(1),
        };
        self.mutate(ApiRequest::put(CART_UPDATE_PATH).json(&body)?)
            .await?;

        info!(cart_product_id, quantity = body.quantity, "Updated cart quantity");
        Ok(())
    }

    /// Increments a cart line by `step`.
    #[instrument(skip(self))]
    pub async fn increase(&self, cart_product_id: u64, step: u32) -> Result<(), ClientError> {
        let body = CartQuantityRequest {
            cart_product_id,
            quantity: step.max(1),
        };
        self.mutate(ApiRequest::post(CART_INCREASE_PATH).json(&body)?)
            .await
    }

    /// Decrements a cart line by `step`.
    #[instrument(skip(self))]
    pub async fn decrease(&self, cart_product_id: u64, step: u32) -> Result<(), ClientError> {
        let body = CartQuantityRequest {
            cart_product_id,
            quantity: step.max(1),
        };
        self.mutate(ApiRequest::delete(CART_DECREASE_PATH).json(&body)?)
            .await
    }

    /// Removes a line from the cart entirely.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_product_id: u64) -> Result<(), ClientError> {
        let body = RemoveCartItemRequest { cart_product_id };
        self.mutate(ApiRequest::delete(CART_PATH).json(&body)?)
            .await?;

        info!(cart_product_id, "Removed item from cart");
        Ok(())
    }

    // Mutation responses carry nothing the client uses beyond success.
    async fn mutate(&self, request: ApiRequest) -> Result<(), ClientError> {
        let envelope = self.client.request::<Value>(&request).await?;
        if let Some(message) = envelope.message {
            debug!(%message, "cart mutation acknowledged");
        }
        Ok(())
    }
}
