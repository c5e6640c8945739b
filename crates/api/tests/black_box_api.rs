use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use storefront_api::app::services::Collaborators;
use storefront_api::config::{ApiConfig, BootstrapAdmin};
use storefront_infra::{CodeMailer, MailError};

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    outbox: Arc<CapturingMailer>,
}

impl TestServer {
    async fn spawn(config: ApiConfig) -> Self {
        storefront_observability::init_for_tests();

        let outbox = Arc::new(CapturingMailer::default());
        let deps = Collaborators {
            mailer: outbox.clone(),
            ..Collaborators::in_memory()
        };

        // Same router as prod, bound to an ephemeral port.
        let app = storefront_api::app::build_app_with(config, deps)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handle,
            outbox,
        }
    }

    async fn with_secret(secret: &str) -> Self {
        Self::spawn(ApiConfig::with_secret(secret)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Keeps the last code sent to each address.
#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<HashMap<String, String>>,
}

impl CapturingMailer {
    fn code_for(&self, email: &str) -> String {
        self.sent
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .expect("no code sent to this address")
    }
}

#[async_trait]
impl CodeMailer for CapturingMailer {
    async fn send_code(&self, email: &str, code: &str, _valid_for: Duration) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .insert(email.to_string(), code.to_string());
        Ok(())
    }
}

fn mint_jwt_at(secret: &str, user_id: &str, role: &str, issued_at: chrono::DateTime<Utc>) -> String {
    let claims = json!({
        "userId": user_id,
        "email": format!("{user_id}@example.com"),
        "role": role,
        "iat": issued_at.timestamp(),
        "exp": (issued_at + ChronoDuration::days(7)).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn missing_sweet_id() -> &'static str {
    "0190c0de-0000-7000-8000-000000000000"
}

fn mint_jwt(secret: &str, user_id: &str, role: &str) -> String {
    mint_jwt_at(secret, user_id, role, Utc::now())
}

async fn create_sweet(
    client: &reqwest::Client,
    srv: &TestServer,
    admin_token: &str,
    name: &str,
    quantity: u32,
) -> serde_json::Value {
    let res = client
        .post(srv.url("/api/sweets"))
        .bearer_auth(admin_token)
        .json(&json!({
            "name": name,
            "category": "Sweet",
            "price": 250.0,
            "quantity": quantity,
            "image": "/img/sweet.jpg",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn stock_of(client: &reqwest::Client, srv: &TestServer, id: &str) -> u64 {
    let p: serde_json::Value = client
        .get(srv.url(&format!("/api/sweets/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    p["quantity"].as_u64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::with_secret(SECRET).await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_order_listing_is_unauthorized() {
    let srv = TestServer::with_secret(SECRET).await;

    let res = reqwest::get(srv.url("/api/orders")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "authentication required");
}

#[tokio::test]
async fn bad_tokens_are_treated_as_anonymous() {
    let srv = TestServer::with_secret(SECRET).await;
    let client = reqwest::Client::new();

    let expired = mint_jwt_at(SECRET, "u1", "user", Utc::now() - ChronoDuration::days(8));
    let foreign = mint_jwt("some-other-secret", "u1", "admin");
    let mut tampered = mint_jwt(SECRET, "u1", "user").into_bytes();
    let last = tampered.len() - 1;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    for token in [expired, foreign, tampered, "garbage".to_string()] {
        let res = client
            .get(srv.url("/api/auth/me"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    // Non-bearer schemes carry no identity either.
    let res = client
        .get(srv.url("/api/auth/me"))
        .header("Authorization", format!("Basic {}", mint_jwt(SECRET, "u1", "user")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // The catalog stays readable with a rejected token.
    let res = client
        .get(srv.url("/api/sweets"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn me_echoes_the_verified_claim() {
    let srv = TestServer::with_secret(SECRET).await;
    let token = mint_jwt(SECRET, "u42", "user");

    let res = reqwest::Client::new()
        .get(srv.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["userId"], "u42");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn catalog_writes_require_admin() {
    let srv = TestServer::with_secret(SECRET).await;
    let client = reqwest::Client::new();
    let payload = json!({
        "name": "Soan Papdi",
        "category": "Sweet",
        "price": 120.0,
        "image": "/img/soan.jpg",
    });

    let res = client
        .post(srv.url("/api/sweets"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let user = mint_jwt(SECRET, "u1", "user");
    let res = client
        .post(srv.url("/api/sweets"))
        .bearer_auth(&user)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    // Nothing was created.
    let listed: Vec<serde_json::Value> = client
        .get(srv.url("/api/sweets"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn gate_rejects_before_the_body_is_read() {
    let srv = TestServer::with_secret(SECRET).await;
    let client = reqwest::Client::new();
    let user = mint_jwt(SECRET, "u1", "user");
    let admin = mint_jwt(SECRET, "admin-1", "admin");

    let res = client
        .post(srv.url("/api/sweets"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let res = client
        .post(srv.url(&format!("/api/sweets/{}/restock", missing_sweet_id())))
        .bearer_auth(&user)
        .body("quantity=3")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(srv.url("/api/orders"))
        .body("no content type")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    // Past the gate, a bad body still gets the common error shape.
    let res = client
        .post(srv.url("/api/sweets"))
        .bearer_auth(&admin)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn purchase_rejects_invalid_quantities_without_taking_stock() {
    let srv = TestServer::with_secret(SECRET).await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, "admin-1", "admin");
    let buyer = mint_jwt(SECRET, "buyer", "user");

    let sweet = create_sweet(&client, &srv, &admin, "Sandesh", 5).await;
    let id = sweet["id"].as_str().unwrap().to_string();

    let invalid = [
        json!({ "quantity": -1 }),
        json!({ "quantity": "3" }),
        json!({ "quantity": 2.5 }),
        json!({ "quantity": 0 }),
    ];
    for bad in invalid {
        let res = client
            .post(srv.url(&format!("/api/sweets/{id}/purchase")))
            .bearer_auth(&buyer)
            .json(&bad)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body {bad}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Quantity must be at least 1");
        assert_eq!(stock_of(&client, &srv, &id).await, 5);
    }

    // No body at all buys a single unit.
    let res = client
        .post(srv.url(&format!("/api/sweets/{id}/purchase")))
        .bearer_auth(&buyer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(stock_of(&client, &srv, &id).await, 4);
}

#[tokio::test]
async fn admin_manages_catalog_and_public_reads_it() {
    let srv = TestServer::with_secret(SECRET).await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, "admin-1", "admin");

    let created = create_sweet(&client, &srv, &admin, "Kaju Katli", 5).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["isAvailable"], true);

    let res = client
        .post(srv.url("/api/sweets"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Kaju Katli", "category": "Sweet", "price": 1.0, "image": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url(&format!("/api/sweets/{id}/restock")))
        .bearer_auth(&admin)
        .json(&json!({ "quantity": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let restocked: serde_json::Value = res.json().await.unwrap();
    assert_eq!(restocked["quantity"], 15);

    let res = client
        .put(srv.url(&format!("/api/sweets/{id}")))
        .bearer_auth(&admin)
        .json(&json!({ "price": 300.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let found: Vec<serde_json::Value> = client
        .get(srv.url("/api/sweets/search?name=kaju&minPrice=299&maxPrice=300"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let res = client
        .get(srv.url("/api/sweets/search?category=Cake"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let none: Vec<serde_json::Value> = res.json().await.unwrap();
    assert!(none.is_empty());

    let res = client
        .delete(srv.url(&format!("/api/sweets/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(srv.url(&format!("/api/sweets/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_login_roundtrip_via_one_time_code() {
    let srv = TestServer::with_secret(SECRET).await;
    let client = reqwest::Client::new();
    let email = "meera@example.com";
    let register = json!({
        "name": "Meera",
        "email": email,
        "password": "rasmalai",
    });

    // Unverified registration is refused and creates nothing.
    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&register)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Please verify your email before registering");

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": "rasmalai" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/api/auth/send-otp"))
        .json(&json!({ "email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let code = srv.outbox.code_for(email);

    let res = client
        .post(srv.url("/api/auth/verify-otp"))
        .json(&json!({ "email": email, "otp": "000000" }))
        .send()
        .await
        .unwrap();
    // Generated codes are 100000..=999999.
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/api/auth/verify-otp"))
        .json(&json!({ "email": email, "otp": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&register)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let session: serde_json::Value = res.json().await.unwrap();
    assert_eq!(session["user"]["role"], "user");
    assert!(session["user"].get("passwordHash").is_none());

    let token = session["token"].as_str().unwrap();
    let claim = storefront_auth::ClaimCodec::new(SECRET).decode(token).unwrap();
    assert_eq!(claim.role, storefront_auth::Role::Standard);
    assert_eq!(claim.email, email);

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "MEERA@example.com", "password": "rasmalai" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let login: serde_json::Value = res.json().await.unwrap();

    let res = client
        .get(srv.url("/api/auth/me"))
        .bearer_auth(login["token"].as_str().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The code was consumed by the registration.
    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&register)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bootstrap_admin_can_log_in_and_write() {
    let config = ApiConfig {
        bootstrap_admin: Some(BootstrapAdmin {
            email: "owner@example.com".to_string(),
            password: "barfi".to_string(),
        }),
        ..ApiConfig::with_secret(SECRET)
    };
    let srv = TestServer::spawn(config).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "owner@example.com", "password": "barfi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let session: serde_json::Value = res.json().await.unwrap();
    assert_eq!(session["user"]["role"], "admin");

    create_sweet(&client, &srv, session["token"].as_str().unwrap(), "Ghevar", 1).await;
}

#[tokio::test]
async fn orders_decrement_stock_and_are_scoped_per_account() {
    let srv = TestServer::with_secret(SECRET).await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(SECRET, "admin-1", "admin");
    let alice = mint_jwt(SECRET, "alice", "user");
    let bob = mint_jwt(SECRET, "bob", "user");

    let sweet = create_sweet(&client, &srv, &admin, "Motichoor Ladoo", 3).await;
    let id = sweet["id"].as_str().unwrap();
    let order = |qty: u32| {
        json!({
            "items": [{ "sweetId": id, "quantity": qty }],
            "paymentMethod": "UPI",
            "deliveryAddress": "4 Chandni Chowk",
        })
    };

    let res = client
        .post(srv.url("/api/orders"))
        .json(&order(1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&alice)
        .json(&order(2))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let placed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(placed["userId"], "alice");
    assert_eq!(placed["totalAmount"], 500.0);
    assert_eq!(placed["status"], "confirmed");

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&bob)
        .json(&order(2))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Insufficient stock for Motichoor Ladoo");

    let res = client
        .post(srv.url(&format!("/api/sweets/{id}/purchase")))
        .bearer_auth(&bob)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let receipt: serde_json::Value = res.json().await.unwrap();
    assert_eq!(receipt["sweet"]["quantity"], 0);
    assert_eq!(receipt["totalCost"], 250.0);

    let mine: Vec<serde_json::Value> = client
        .get(srv.url("/api/orders"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(mine.is_empty());

    let all: Vec<serde_json::Value> = client
        .get(srv.url("/api/orders"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}
