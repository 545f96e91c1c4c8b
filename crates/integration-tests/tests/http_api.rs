//! The checkout API driven through the router, without a socket.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use pineapple_checkout::middleware::REQUEST_ID_HEADER;
use pineapple_checkout::routes;
use pineapple_checkout_integration_tests::Harness;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Response {
    status: StatusCode,
    request_id: Option<String>,
    body: Value,
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    Response {
        status,
        request_id,
        body,
    }
}

fn app() -> Router {
    routes::app(Harness::new().app_state())
}

fn us_address() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "street_address_1": "1470 Pinewood Avenue",
        "city": "Michigan City",
        "postal_code": "49360",
        "country": "us",
        "country_area": "MI"
    })
}

async fn create(app: &Router, lines: Value) -> String {
    let response = send(
        app,
        Method::POST,
        "/checkouts",
        Some(json!({
            "channel": "default-channel",
            "email": "buyer@example.com",
            "lines": lines,
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let response = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Value::String("ok".to_string()));
    assert!(response.request_id.is_some());
}

#[tokio::test]
async fn test_digital_checkout_over_http() {
    let app = app();
    let token = create(&app, json!([{"variant_id": "ebook", "quantity": 1}])).await;

    let checkout = send(&app, Method::GET, &format!("/checkouts/{token}"), None).await;
    assert_eq!(checkout.body["is_shipping_required"], false);
    assert_eq!(checkout.body["stage"], "PAYMENT_PENDING");

    let payment = send(&app, Method::POST, &format!("/checkouts/{token}/payment"), None).await;
    assert_eq!(payment.status, StatusCode::OK);
    assert_eq!(payment.body["success"], true);

    let order = send(&app, Method::POST, &format!("/checkouts/{token}/complete"), None).await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["status"], "UNFULFILLED");
    assert_eq!(order.body["is_shipping_required"], false);

    let id = order.body["id"].as_str().unwrap();
    let fetched = send(&app, Method::GET, &format!("/orders/{id}"), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, order.body);

    let by_checkout = send(&app, Method::GET, &format!("/checkouts/{token}/order"), None).await;
    assert_eq!(by_checkout.body, order.body);

    let again = send(&app, Method::POST, &format!("/checkouts/{token}/complete"), None).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["errors"][0]["code"], "CHECKOUT_COMPLETED");
}

#[tokio::test]
async fn test_physical_checkout_over_http() {
    let app = app();
    let token = create(&app, json!([{"variant_id": "mug", "quantity": 1}])).await;

    let payment = send(&app, Method::POST, &format!("/checkouts/{token}/payment"), None).await;
    assert_eq!(payment.status, StatusCode::OK);
    assert_eq!(payment.body["success"], false);
    assert_eq!(payment.body["errors"].as_array().unwrap().len(), 1);
    assert_eq!(
        payment.body["errors"][0]["code"],
        "SHIPPING_METHOD_REQUIRED"
    );

    let method = send(
        &app,
        Method::PUT,
        &format!("/checkouts/{token}/shipping-method"),
        Some(json!({"name": "Standard"})),
    )
    .await;
    assert_eq!(method.status, StatusCode::NOT_FOUND);
    assert_eq!(method.body["errors"][0]["code"], "SHIPPING_METHOD_NOT_FOUND");

    let address = send(
        &app,
        Method::PUT,
        &format!("/checkouts/{token}/shipping-address"),
        Some(us_address()),
    )
    .await;
    assert_eq!(address.status, StatusCode::OK);
    assert_eq!(address.body["shipping_address"]["country"], "US");
    assert_eq!(address.body["stage"], "METHOD_PENDING");

    let methods = send(
        &app,
        Method::GET,
        &format!("/checkouts/{token}/shipping-methods"),
        None,
    )
    .await;
    assert_eq!(methods.body.as_array().unwrap().len(), 2);

    let method = send(
        &app,
        Method::PUT,
        &format!("/checkouts/{token}/shipping-method"),
        Some(json!({"name": "Standard"})),
    )
    .await;
    assert_eq!(method.status, StatusCode::OK);
    assert_eq!(method.body["shipping_method"]["id"], "us-standard");

    let payment = send(&app, Method::POST, &format!("/checkouts/{token}/payment"), None).await;
    assert_eq!(payment.body["success"], true);
    assert!(payment.body["errors"].as_array().unwrap().is_empty());

    let readiness = send(&app, Method::GET, &format!("/checkouts/{token}/readiness"), None).await;
    assert_eq!(readiness.body["ready"], true);
    assert_eq!(readiness.body["stage"], "PAYMENT_READY");

    let order = send(&app, Method::POST, &format!("/checkouts/{token}/complete"), None).await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["is_shipping_required"], true);
    assert_eq!(order.body["status"], "UNFULFILLED");
}

#[tokio::test]
async fn test_not_ready_lists_each_requirement() {
    let app = app();
    let token = create(&app, json!([{"variant_id": "poster", "quantity": 1}])).await;

    let response = send(&app, Method::POST, &format!("/checkouts/{token}/complete"), None).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    let fields: Vec<&str> = response.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["shipping_address", "shipping_method", "payment"]);
}

#[tokio::test]
async fn test_rejected_address_is_unprocessable() {
    let app = app();
    let token = create(&app, json!([{"variant_id": "mug", "quantity": 1}])).await;

    let mut address = us_address();
    address["country"] = json!("PL");
    let response = send(
        &app,
        Method::PUT,
        &format!("/checkouts/{token}/shipping-address"),
        Some(address),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"][0]["code"], "ADDRESS_REJECTED");
    assert_eq!(response.body["errors"][0]["field"], "country");
}

#[tokio::test]
async fn test_bad_requests() {
    let app = app();

    let response = send(&app, Method::GET, "/checkouts/not-a-token", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["code"], "BAD_REQUEST");

    let response = send(&app, Method::GET, "/orders/not-an-id", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        Method::POST,
        "/checkouts",
        Some(json!({"channel": "default-channel"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        Method::POST,
        "/checkouts",
        Some(json!({
            "channel": "default-channel",
            "email": "buyer@example.com",
            "lines": [],
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"][0]["code"], "EMPTY_CART");

    let response = send(
        &app,
        Method::POST,
        "/checkouts",
        Some(json!({
            "channel": "nowhere",
            "email": "buyer@example.com",
            "lines": [{"variant_id": "mug", "quantity": 1}],
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["errors"][0]["field"], "channel");
}

#[tokio::test]
async fn test_unknown_checkout_is_not_found() {
    let app = app();
    let token = "7b0c2a8e-1f8b-4f5e-9a55-1d9f3f0c7b21";

    let response = send(&app, Method::GET, &format!("/checkouts/{token}"), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["errors"][0]["code"], "CHECKOUT_NOT_FOUND");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "upstream-123")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "upstream-123"
    );
}
