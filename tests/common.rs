#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use figment::providers::{Format, Yaml};
use figment::Figment;
use serde_json::Value;
use shopgate::config::{extract_config, ConfigV1};
use shopgate::routes::create_router;
use shopgate::startup::build_state;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "Sup3rSecret!";

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
logging:
  level: "debug"
  format: "console"
jwt:
  secret: "integration-test-secret"
credentials:
  cost: 4
store:
  type: memory
categories:
  - Books
  - Electronics
  - Home
"#;

pub fn test_config() -> ConfigV1 {
    extract_config(&Figment::from(Yaml::string(TEST_CONFIG))).expect("test config is valid")
}

pub async fn build_app(config: ConfigV1) -> Router {
    let state = build_state(&config)
        .await
        .expect("test state builds");
    create_router(state)
}

pub async fn test_app() -> Router {
    build_app(test_config()).await
}

pub fn json_request(method: Method, path: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn empty_request(method: Method, path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("router never fails")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Registers an account and returns the id the server assigned.
pub async fn register(app: &Router, email: &str) -> i64 {
    let body = serde_json::json!({ "name": "Test User", "email": email, "password": PASSWORD });
    let response = send(app, json_request(Method::POST, "/users", None, &body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["userId"]
        .as_i64()
        .expect("userId is a number")
}

/// Logs in and returns the bare token from the `Authorization` response header.
pub async fn login(app: &Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": PASSWORD });
    let response = send(app, json_request(Method::POST, "/login", None, &body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get(header::AUTHORIZATION)
        .expect("login returns an Authorization header")
        .to_str()
        .expect("header is ASCII")
        .to_string();
    header
        .strip_prefix("Bearer ")
        .expect("header uses the Bearer scheme")
        .to_string()
}

pub async fn register_and_login(app: &Router, email: &str) -> (i64, String) {
    let id = register(app, email).await;
    (id, login(app, email).await)
}

pub async fn create_shop(app: &Router, token: &str, name: &str) -> i64 {
    let body = serde_json::json!({ "name": name, "address": "1 Market Street" });
    let response = send(app, json_request(Method::POST, "/shops", Some(token), &body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["shopId"]
        .as_i64()
        .expect("shopId is a number")
}

pub async fn create_product(app: &Router, token: &str, shop_id: i64) -> i64 {
    let body = serde_json::json!({
        "shopId": shop_id,
        "name": "Desk lamp",
        "description": "Warm light",
        "categories": ["Home", "Electronics"],
    });
    let response = send(app, json_request(Method::POST, "/products", Some(token), &body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["productId"]
        .as_i64()
        .expect("productId is a number")
}

/// Decodes the payload segment of a token without checking it.
pub fn token_payload(token: &str) -> Value {
    let payload = token.split('.').nth(1).expect("token has a payload");
    let bytes = URL_SAFE_NO_PAD.decode(payload).expect("payload is base64url");
    serde_json::from_slice(&bytes).expect("payload is JSON")
}
