mod common;

use assert_matches::assert_matches;
use common::{cart_body, courier_cost_body, price_check_body, TestBackend};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_client::{
    errors::ClientError,
    services::commerce::{choose_quote, courier_service::NO_SERVICE_MESSAGE},
    state::{CartAction, CartState},
};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, ResponseTemplate,
};

async fn mount_courier(backend: &TestBackend, courier: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/cost"))
        .and(body_string_contains(format!("courier={}", courier)))
        .respond_with(response)
        .mount(&backend.server)
        .await;
}

async fn loaded_cart(backend: &TestBackend) -> CartState {
    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body()))
        .mount(&backend.server)
        .await;

    CartState::from_snapshot(
        backend
            .storefront
            .carts
            .fetch_cart()
            .await
            .expect("cart should load"),
    )
}

#[tokio::test]
async fn lookup_sends_merchant_city_and_group_weight() {
    let backend = TestBackend::start().await;
    let state = loaded_cart(&backend).await;

    Mock::given(method("POST"))
        .and(path("/cost"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("key=rates-key"))
        .and(body_string_contains("origin=151"))
        .and(body_string_contains("destination=23"))
        .and(body_string_contains("weight=2"))
        .and(body_string_contains("courier=jne"))
        .respond_with(ResponseTemplate::new(200).set_body_json(courier_cost_body("jne", "OKE", 9000)))
        .expect(1)
        .mount(&backend.server)
        .await;

    // merchant 1 ships a single 2.0 weight item
    let quote = backend
        .storefront
        .couriers
        .quote("jne", state.groups[0].city_id, 23, 2)
        .await
        .expect("lookup should succeed")
        .expect("jne serves the route");

    assert_eq!(quote.courier, "jne");
    assert_eq!(quote.service, "OKE");
    assert_eq!(quote.cost, dec!(9000));
}

#[tokio::test]
async fn failing_couriers_are_skipped() {
    let backend = TestBackend::start().await;
    let state = loaded_cart(&backend).await;

    mount_courier(
        &backend,
        "jne",
        ResponseTemplate::new(200).set_body_json(courier_cost_body("jne", "REG", 12000)),
    )
    .await;
    mount_courier(
        &backend,
        "pos",
        ResponseTemplate::new(200).set_body_json(courier_cost_body("pos", "Paket Kilat Khusus", 8000)),
    )
    .await;
    mount_courier(
        &backend,
        "tiki",
        ResponseTemplate::new(400).set_body_json(json!({
            "rajaongkir": { "status": { "code": 400, "description": "Invalid courier" } }
        })),
    )
    .await;

    let quotes = backend
        .storefront
        .couriers
        .quotes_for(&state.groups[0], 23)
        .await
        .expect("two couriers should answer");

    let couriers: Vec<&str> = quotes.iter().map(|q| q.courier.as_str()).collect();
    assert_eq!(couriers, vec!["jne", "pos"]);
    assert_eq!(choose_quote(&quotes, None).map(|q| q.cost), Some(dec!(8000)));
}

#[tokio::test]
async fn provider_rejection_carries_its_description() {
    let backend = TestBackend::start().await;

    mount_courier(
        &backend,
        "jne",
        ResponseTemplate::new(400).set_body_json(json!({
            "rajaongkir": { "status": { "code": 400, "description": "Invalid key" } }
        })),
    )
    .await;

    let err = backend
        .storefront
        .couriers
        .quote("jne", 151, 23, 1000)
        .await
        .expect_err("lookup should be rejected");

    assert_eq!(err.status_code().as_u16(), 400);
    assert_eq!(err.user_message(), "Invalid key");
}

#[tokio::test]
async fn route_without_any_service_is_not_found() {
    let backend = TestBackend::start().await;
    let state = loaded_cart(&backend).await;

    Mock::given(method("POST"))
        .and(path("/cost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rajaongkir": { "results": [{ "code": "jne", "name": "JNE", "costs": [] }] }
        })))
        .mount(&backend.server)
        .await;

    let err = backend
        .storefront
        .couriers
        .quotes_for(&state.groups[0], 23)
        .await
        .expect_err("no courier serves the route");

    assert_matches!(
        err,
        ClientError::Remote { ref message, .. } if message == NO_SERVICE_MESSAGE
    );
    assert_eq!(err.status_code().as_u16(), 404);
}

#[tokio::test]
async fn quoted_couriers_feed_the_price_check() {
    let backend = TestBackend::start().await;
    let mut state = loaded_cart(&backend).await;

    mount_courier(
        &backend,
        "jne",
        ResponseTemplate::new(200).set_body_json(courier_cost_body("jne", "REG", 11000)),
    )
    .await;
    mount_courier(
        &backend,
        "pos",
        ResponseTemplate::new(200).set_body_json(courier_cost_body("pos", "Paket Kilat Khusus", 9000)),
    )
    .await;
    mount_courier(
        &backend,
        "tiki",
        ResponseTemplate::new(200).set_body_json(courier_cost_body("tiki", "REG", 10000)),
    )
    .await;

    for group in state.groups.clone() {
        let quotes = backend
            .storefront
            .couriers
            .quotes_for(&group, 23)
            .await
            .expect("quotes should load");
        let quote = choose_quote(&quotes, None).expect("a cheapest quote");
        state = state.reduce(CartAction::CourierSelected {
            merchant_id: group.merchant_id,
            courier_id: quote.courier.clone(),
            cost: quote.cost,
        });
    }

    Mock::given(method("POST"))
        .and(path("/checkout/check-price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(price_check_body("22000")))
        .mount(&backend.server)
        .await;

    assert!(state.ready_for_price_check());
    let request = state.price_check_request(5).expect("request should build");
    assert!(request
        .merchant
        .iter()
        .all(|m| m.courier_id == "pos" && m.courier_price == dec!(9000)));
    assert_eq!(state.display_total(), dec!(4000) + dec!(18000));

    let checked = backend
        .storefront
        .pricing
        .check_price(&request)
        .await
        .expect("price check should succeed");
    assert_eq!(checked.total_price, dec!(22000));
}
