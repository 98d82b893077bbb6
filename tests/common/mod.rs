use std::sync::Arc;

use serde_json::{json, Value};
use storefront_client::{
    auth::{InMemoryTokenStore, TokenPair},
    config::ClientConfig,
    Storefront,
};
use wiremock::MockServer;

/// Mock marketplace backend plus a storefront client pointed at it.
pub struct TestBackend {
    pub server: MockServer,
    pub tokens: Arc<InMemoryTokenStore>,
    pub storefront: Storefront,
}

impl TestBackend {
    /// Backend with a logged-in session (`token1` / `refresh1`).
    pub async fn start() -> Self {
        Self::with_tokens(TokenPair::new("token1", "refresh1")).await
    }

    pub async fn with_tokens(tokens: TokenPair) -> Self {
        let server = MockServer::start().await;
        let tokens = Arc::new(InMemoryTokenStore::new(tokens));
        let mut config = ClientConfig::new(server.uri());
        config.courier_rates_url = server.uri();
        config.courier_api_key = Some("rates-key".into());
        let storefront =
            Storefront::new(config, tokens.clone()).expect("storefront should build");

        Self {
            server,
            tokens,
            storefront,
        }
    }

    /// Authorization headers of every request the backend has seen, in order.
    #[allow(dead_code)]
    pub async fn authorization_headers(&self) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| {
                request
                    .headers
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned)
            })
            .collect()
    }
}

/// Rate provider answer quoting `courier` at `cost`.
#[allow(dead_code)]
pub fn courier_cost_body(courier: &str, service: &str, cost: u64) -> Value {
    json!({
        "rajaongkir": {
            "status": { "code": 200, "description": "OK" },
            "results": [{
                "code": courier,
                "name": courier.to_uppercase(),
                "costs": [{
                    "service": service,
                    "description": "",
                    "cost": [{ "value": cost, "etd": "2-3", "note": "" }]
                }]
            }]
        }
    })
}

/// `GET /cart` body: two merchants, merchant 3 listed first.
#[allow(dead_code)]
pub fn cart_body() -> Value {
    json!({
        "data": {
            "id": 12,
            "total": "4500",
            "products": [
                cart_product(1, 3, "1000", 2, 1.0),
                cart_product(2, 1, "500", 1, 2.0),
                cart_product(3, 3, "1500", 1, 0.5)
            ]
        },
        "message": "success"
    })
}

#[allow(dead_code)]
pub fn cart_product(cart_product_id: u64, merchant_id: u64, price: &str, amount: u32, weight: f64) -> Value {
    json!({
        "cart_product_id": cart_product_id,
        "product_id": cart_product_id * 10,
        "merchant_id": merchant_id,
        "merchant_name": format!("Toko {}", merchant_id),
        "variant_combination_product_id": cart_product_id * 100,
        "city_id": 151,
        "title": format!("Product {}", cart_product_id),
        "photo": "",
        "amount": amount,
        "variant": "",
        "weight": weight,
        "price": price,
        "stock": 20
    })
}

#[allow(dead_code)]
pub fn price_check_body(total: &str) -> Value {
    json!({
        "data": {
            "total_price": total,
            "discount": "0",
            "cut_price": "",
            "merchant": [{
                "merchant_id": 1,
                "merchant_name": "Toko 1",
                "total_price": total,
                "ongkir": "9000",
                "CheckPriceProducts": []
            }]
        }
    })
}
