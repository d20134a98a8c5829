mod common;

use axum::http::{header, Method, StatusCode};
use chrono::Utc;
use common::*;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

fn forge_token(sub: &str, exp: i64, secret: &str) -> String {
    encode(
        &Header::default(),
        &json!({ "sub": sub, "exp": exp }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encodes")
}

#[tokio::test]
async fn owner_edits_and_a_second_user_is_forbidden() {
    let app = test_app().await;
    let (_, owner_token) = register_and_login(&app, "owner@example.com").await;
    let shop_id = create_shop(&app, &owner_token, "Corner Shop").await;

    let edit = json!({ "name": "Corner Shop Deluxe", "address": "2 Market Street" });
    let path = format!("/shops/{}", shop_id);
    let response = send(&app, json_request(Method::PUT, &path, Some(&owner_token), &edit)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, other_token) = register_and_login(&app, "other@example.com").await;
    let hijack = json!({ "name": "Mine now", "address": "Elsewhere" });
    let response = send(&app, json_request(Method::PUT, &path, Some(&other_token), &hijack)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, empty_request(Method::GET, &path, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let shop = body_json(response).await;
    assert_eq!(shop["name"], "Corner Shop Deluxe");
}

#[tokio::test]
async fn issued_token_carries_only_subject_and_expiry() {
    let app = test_app().await;
    let (user_id, token) = register_and_login(&app, "ada@example.com").await;

    let payload = token_payload(&token);
    let object = payload.as_object().expect("payload is an object");
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["exp", "sub"]);
    assert_eq!(payload["sub"], user_id.to_string());

    let exp = payload["exp"].as_i64().expect("exp is numeric");
    let expected = Utc::now().timestamp() + 6 * 60 * 60;
    assert!((expected - exp).abs() <= 5, "exp {} is not six hours out", exp);
}

#[tokio::test]
async fn mutations_without_a_valid_token_are_rejected_uniformly() {
    let app = test_app().await;
    let (user_id, token) = register_and_login(&app, "ada@example.com").await;
    let shop_id = create_shop(&app, &token, "Corner Shop").await;
    let path = format!("/shops/{}", shop_id);

    let mut tampered = token.clone();
    tampered.push('x');
    let expired = forge_token(&user_id.to_string(), Utc::now().timestamp() - 1, TEST_SECRET);
    let foreign = forge_token(&user_id.to_string(), Utc::now().timestamp() + 60, "another-secret");
    let unsigned = format!(
        "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.",
        token.split('.').nth(1).expect("payload")
    );

    let mut messages = Vec::new();
    for candidate in [None, Some(tampered.as_str()), Some(expired.as_str()), Some(foreign.as_str()), Some(unsigned.as_str())] {
        let response = send(&app, empty_request(Method::DELETE, &path, candidate)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).expect("challenge"),
            "Bearer"
        );
        messages.push(body_json(response).await["message"].clone());
    }
    assert!(messages.windows(2).all(|pair| pair[0] == pair[1]));

    // Nothing was deleted.
    let response = send(&app, empty_request(Method::GET, &path, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_authorization_scheme_is_unauthenticated() {
    let app = test_app().await;
    let (_, token) = register_and_login(&app, "ada@example.com").await;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/shops")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Basic {}", token))
        .body(axum::body::Body::from(
            json!({ "name": "x", "address": "y" }).to_string(),
        ))
        .expect("request builds");
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_resources_are_not_found_for_everyone() {
    let app = test_app().await;
    let (_, token) = register_and_login(&app, "ada@example.com").await;
    let edit = json!({ "name": "n", "address": "a" });

    let response = send(&app, json_request(Method::PUT, "/shops/999", Some(&token), &edit)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, empty_request(Method::DELETE, "/products/999", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, empty_request(Method::GET, "/shops/999", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_ownership_follows_the_parent_shop() {
    let app = test_app().await;
    let (_, owner_token) = register_and_login(&app, "owner@example.com").await;
    let (_, other_token) = register_and_login(&app, "other@example.com").await;
    let shop_id = create_shop(&app, &owner_token, "Lamps").await;
    let product_id = create_product(&app, &owner_token, shop_id).await;
    let path = format!("/products/{}", product_id);

    let edit = json!({ "name": "Floor lamp", "description": "Tall", "categories": ["Home"] });
    let response = send(&app, json_request(Method::PUT, &path, Some(&other_token), &edit)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, json_request(Method::PUT, &path, Some(&owner_token), &edit)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, empty_request(Method::GET, &path, None)).await;
    let product = body_json(response).await;
    assert_eq!(product["name"], "Floor lamp");
    assert_eq!(product["shopId"], shop_id);

    let response = send(&app, empty_request(Method::DELETE, &path, Some(&other_token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = send(&app, empty_request(Method::DELETE, &path, Some(&owner_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, empty_request(Method::GET, &path, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creating_a_product_checks_shop_ownership_and_categories() {
    let app = test_app().await;
    let (_, owner_token) = register_and_login(&app, "owner@example.com").await;
    let (_, other_token) = register_and_login(&app, "other@example.com").await;
    let shop_id = create_shop(&app, &owner_token, "Books & more").await;

    let product = |shop: i64, categories: serde_json::Value| {
        json!({ "shopId": shop, "name": "Novel", "description": "Thick", "categories": categories })
    };

    let response = send(
        &app,
        json_request(Method::POST, "/products", Some(&other_token), &product(shop_id, json!(["Books"]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(Method::POST, "/products", Some(&owner_token), &product(424242, json!(["Books"]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(Method::POST, "/products", Some(&owner_token), &product(shop_id, json!(["Garden"]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(Method::POST, "/products", Some(&owner_token), &product(shop_id, json!([]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(Method::POST, "/products", Some(&owner_token), &product(shop_id, json!(["Books"]))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn deleting_a_shop_removes_its_products() {
    let app = test_app().await;
    let (_, token) = register_and_login(&app, "owner@example.com").await;
    let shop_id = create_shop(&app, &token, "Closing down").await;
    let product_id = create_product(&app, &token, shop_id).await;

    let response = send(&app, empty_request(Method::DELETE, &format!("/shops/{}", shop_id), Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, empty_request(Method::GET, &format!("/products/{}", product_id), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_rejects_bad_input_and_duplicates() {
    let app = test_app().await;
    register(&app, "ada@example.com").await;

    for body in [
        json!({ "name": "Ada", "email": "ada@example.com", "password": PASSWORD }),
        json!({ "name": "Bob", "email": "not-an-email", "password": PASSWORD }),
        json!({ "name": "Bob", "email": "bob@example.com", "password": "short" }),
        json!({ "name": "Bob", "email": "bob@example.com", "password": format!("{}first", "a".repeat(72)) }),
        json!({ "name": "Bob", "email": "bob@example.com" }),
    ] {
        let response = send(&app, json_request(Method::POST, "/users", None, &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
    }
}

#[tokio::test]
async fn login_failures_share_one_answer() {
    let app = test_app().await;
    register(&app, "ada@example.com").await;

    let wrong_password = json!({ "email": "ada@example.com", "password": "wrong-password" });
    let unknown_email = json!({ "email": "nobody@example.com", "password": PASSWORD });

    let first = send(&app, json_request(Method::POST, "/login", None, &wrong_password)).await;
    let second = send(&app, json_request(Method::POST, "/login", None, &unknown_email)).await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    assert!(first.headers().get(header::AUTHORIZATION).is_none());
    assert_eq!(body_json(first).await, body_json(second).await);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = test_app().await;
    let (_, token) = register_and_login(&app, "ada@example.com").await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/shops")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(axum::body::Body::from("{ not json"))
        .expect("request builds");
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, empty_request(Method::GET, "/shops/abc", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn public_listings_need_no_token() {
    let app = test_app().await;
    let (_, token) = register_and_login(&app, "ada@example.com").await;
    let shop_id = create_shop(&app, &token, "Corner Shop").await;
    create_product(&app, &token, shop_id).await;

    let response = send(&app, empty_request(Method::GET, "/shops", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(1));

    let response = send(&app, empty_request(Method::GET, "/products", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(1));

    let response = send(&app, empty_request(Method::GET, "/categories", None)).await;
    let categories = body_json(response).await;
    let names: Vec<&str> = categories
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Books", "Electronics", "Home"]);
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let app = test_app().await;
    register_and_login(&app, "ada@example.com").await;

    let response = send(&app, empty_request(Method::GET, "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, empty_request(Method::GET, "/metrics", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf-8");
    assert!(text.contains("logins_total{result=\"success\"} 1"));
    assert!(text.contains("registrations_total{result=\"created\"} 1"));
}

#[tokio::test]
async fn non_utf8_authorization_header_is_rejected_and_counted() {
    let app = test_app().await;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/shops")
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            axum::http::HeaderValue::from_bytes(b"Bearer \xff\xfe").expect("opaque bytes are allowed"),
        )
        .body(axum::body::Body::from(
            json!({ "name": "x", "address": "y" }).to_string(),
        ))
        .expect("request builds");
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, empty_request(Method::GET, "/metrics", None)).await;
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf-8");
    assert!(text.contains("token_verifications_total{result=\"malformed\"} 1"));
}

#[tokio::test]
async fn missing_shops_and_products_share_one_not_found_answer() {
    let app = test_app().await;
    let (_, token) = register_and_login(&app, "ada@example.com").await;

    let shop = send(&app, empty_request(Method::DELETE, "/shops/999", Some(&token))).await;
    let product = send(&app, empty_request(Method::DELETE, "/products/999", Some(&token))).await;
    assert_eq!(shop.status(), StatusCode::NOT_FOUND);
    assert_eq!(product.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(shop).await, body_json(product).await);
}
