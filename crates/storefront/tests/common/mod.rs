//! Shared harness for integration tests.
//!
//! Spawns the full router on an ephemeral port against a wiremock stand-in
//! for the remote shop API. The poll interval is shortened so payment
//! polling tests finish quickly.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use duka_storefront::config::{PaybillConfig, StorefrontConfig};
use duka_storefront::state::AppState;

/// How fast the payment poller ticks in tests.
pub const TEST_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Generous checkout TTL so it never interferes with ordinary tests.
pub const TEST_CHECKOUT_TTL: Duration = Duration::from_secs(60);

pub struct TestApp {
    pub address: String,
    pub api: MockServer,
    /// Cookie-holding client: one client per visitor session.
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    pub async fn get_text(&self, path: &str) -> String {
        self.get(path).await.text().await.expect("body read failed")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("request failed")
    }

    /// Put one "Gigabit Router" (Ksh 4,500) in the session cart.
    pub async fn add_router_to_cart(&self) {
        let response = self
            .post_form(
                "/cart/add",
                &[
                    ("product_id", "p1"),
                    ("name", "Gigabit Router"),
                    ("price", "4500"),
                ],
            )
            .await;
        assert!(response.status().is_success());
    }

    /// Submit a valid checkout form with the given payment method.
    pub async fn submit_checkout(&self, payment_method: &str) -> reqwest::Response {
        self.post_form(
            "/checkout",
            &[
                ("customer_name", "Jane Wanjiku"),
                ("customer_email", "jane@example.com"),
                ("customer_phone", "254712345678"),
                ("shipping_address", "Moi Avenue, Nairobi"),
                ("payment_method", payment_method),
            ],
        )
        .await
    }

    /// Number of payment status checks the backend has received so far.
    pub async fn status_poll_count(&self) -> usize {
        self.api
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/mpesa/check_payment_status.php")
            .count()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_checkout_ttl(TEST_CHECKOUT_TTL).await
}

/// Like [`spawn_app`], but with a custom checkout TTL for tests that
/// exercise abandoned-checkout teardown.
pub async fn spawn_app_with_checkout_ttl(checkout_ttl: Duration) -> TestApp {
    let api = MockServer::start().await;

    let config = StorefrontConfig {
        host: "127.0.0.1".parse().expect("valid host"),
        port: 0,
        base_url: "http://localhost:0".to_string(),
        api_base_url: api.uri(),
        paybill: PaybillConfig {
            number: "522533".to_string(),
            account: "7577359".to_string(),
        },
        poll_interval: TEST_POLL_INTERVAL,
        checkout_ttl,
        whatsapp_number: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };

    let state = AppState::new(config).expect("app state");
    let app = duka_storefront::app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("client");

    TestApp {
        address: format!("http://{addr}"),
        api,
        client,
    }
}

// =============================================================================
// Backend mocks
// =============================================================================

pub async fn mock_create_order(api: &MockServer, order_ref: &str) {
    Mock::given(method("POST"))
        .and(path("/orders/create_order.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "order_ref": order_ref })))
        .mount(api)
        .await;
}

pub async fn mock_stk_push(api: &MockServer, response_code: &str) {
    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "responseCode": response_code })),
        )
        .mount(api)
        .await;
}

pub async fn mock_payment_status(api: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path("/mpesa/check_payment_status.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "payment_status": status })),
        )
        .mount(api)
        .await;
}

pub async fn mock_featured(api: &MockServer, products: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/products/featured.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products))
        .mount(api)
        .await;
}

pub async fn mock_categories(api: &MockServer, categories: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/categories/list.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(categories))
        .mount(api)
        .await;
}

pub async fn mock_search(api: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/products/search.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(api)
        .await;
}

/// Wait long enough for several poller ticks to fire.
pub async fn wait_for_polls() {
    tokio::time::sleep(TEST_POLL_INTERVAL * 5).await;
}
