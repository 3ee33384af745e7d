//! Integration test harness for ShopHub.
//!
//! Everything runs in-process: the services sit on the in-memory repository
//! and both routers use the tower-sessions `MemoryStore`, so no database or
//! listener is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shophub-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `allocator` - Sequential id allocation under contention
//! - `order_workflow` - Cart to order to invoice through the services
//! - `storefront_api` - Customer HTTP flows
//! - `admin_api` - Back-office HTTP flows

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use shophub_core::catalog::{Category, CategoryInput, Product, ProductInput};
use shophub_core::memory::MemoryRepository;
use shophub_core::order::TransitionPolicy;
use shophub_core::repository::Repositories;
use shophub_core::services::{DEFAULT_MAX_ATTEMPTS, ServiceSettings, Services};
use shophub_core::user::{Principal, Registration};
use shophub_core::Price;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

/// Password used for every account the harness creates.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Email of the administrator created by [`TestContext::new`].
pub const ADMIN_EMAIL: &str = "admin@shophub.test";

/// Services over a fresh in-memory store, with one administrator account.
pub struct TestContext {
    pub repo: Arc<MemoryRepository>,
    pub services: Services,
    pub admin: Principal,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_settings(ServiceSettings::default()).await
    }

    pub async fn with_policy(policy: TransitionPolicy) -> Self {
        Self::with_settings(ServiceSettings {
            transition_policy: policy,
            ..ServiceSettings::default()
        })
        .await
    }

    pub async fn with_settings(settings: ServiceSettings) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let services = Services::new(&Repositories::from_backend(repo.clone()), settings);
        let admin = services
            .accounts
            .register_admin("Store Admin", ADMIN_EMAIL, TEST_PASSWORD)
            .await
            .expect("Failed to create admin")
            .principal();
        Self {
            repo,
            services,
            admin,
        }
    }

    /// Register a customer account and return its principal.
    pub async fn customer(&self, name: &str, email: &str) -> Principal {
        self.services
            .accounts
            .register(Registration {
                name: name.to_owned(),
                email: email.to_owned(),
                password: TEST_PASSWORD.to_owned(),
                phone: "555".to_owned(),
                address: "1 Main St".to_owned(),
            })
            .await
            .expect("Failed to register customer")
            .principal()
    }

    pub async fn category(&self, category_id: &str, name: &str) -> Category {
        self.services
            .catalog
            .create_category(
                &self.admin,
                CategoryInput {
                    category_id: category_id.to_owned(),
                    name: name.to_owned(),
                    active: true,
                },
            )
            .await
            .expect("Failed to create category")
    }

    /// Create a product; prices are in cents.
    pub async fn product(
        &self,
        category_id: &str,
        name: &str,
        cost_cents: i64,
        sell_cents: i64,
    ) -> Product {
        self.services
            .catalog
            .create_product(&self.admin, product_input(category_id, name, cost_cents, sell_cents))
            .await
            .expect("Failed to create product")
    }

    /// The "Widget" at 19.99 (cost 12.00) in a "gadgets" category.
    pub async fn widget(&self) -> Product {
        self.category("gadgets", "Gadgets").await;
        self.product("gadgets", "Widget", 1200, 1999).await
    }

    /// Storefront router sharing this context's services.
    #[must_use]
    pub fn storefront(&self) -> TestClient {
        let state = shophub_storefront::state::AppState::new(
            storefront_config(),
            self.services.clone(),
            None,
        );
        let key = storefront_config().session_key().expect("storefront signing key");
        let layer =
            shophub_storefront::middleware::session_layer(MemoryStore::default(), false, key);
        TestClient::new(shophub_storefront::app(state, layer))
    }

    /// Admin router sharing this context's services.
    #[must_use]
    pub fn admin_app(&self) -> TestClient {
        let state =
            shophub_admin::state::AppState::new(admin_config(), self.services.clone(), None);
        let key = admin_config().session_key().expect("admin signing key");
        let layer = shophub_admin::middleware::session_layer(MemoryStore::default(), false, key);
        TestClient::new(shophub_admin::app(state, layer))
    }
}

#[must_use]
pub fn product_input(category_id: &str, name: &str, cost_cents: i64, sell_cents: i64) -> ProductInput {
    ProductInput {
        category_id: category_id.to_owned(),
        name: name.to_owned(),
        description: String::new(),
        cost_price: Price::from_cents(cost_cents),
        sell_price: Price::from_cents(sell_cents),
        stock_qty: 10,
        image_url: String::new(),
        active: true,
    }
}

const SESSION_SECRET: &str =
    "k7#Qp2!vX9@mR4$wT8^zL1&nB6*yH3%dF5(jU0)eG8+cS2=aW7?hN4~rM9<tV1>bX6";

fn storefront_config() -> shophub_storefront::config::StorefrontConfig {
    shophub_storefront::config::StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/shophub_test"),
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from(SESSION_SECRET),
        allocator_max_attempts: DEFAULT_MAX_ATTEMPTS,
        sentry: shophub_storefront::config::SentryConfig::default(),
    }
}

fn admin_config() -> shophub_admin::config::AdminConfig {
    shophub_admin::config::AdminConfig {
        database_url: SecretString::from("postgres://localhost/shophub_test"),
        host: [127, 0, 0, 1].into(),
        port: 3001,
        base_url: "http://localhost:3001".to_owned(),
        session_secret: SecretString::from(SESSION_SECRET),
        transition_policy: TransitionPolicy::Permissive,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}

/// A response reduced to what tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub location: Option<String>,
    /// Parsed JSON body; `Value::Null` for an empty body.
    pub body: Value,
}

/// Drives a router with `oneshot`, carrying the session cookie like a browser.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub const fn new(router: Router) -> Self {
        Self {
            router,
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&mut self, uri: &str) -> TestResponse {
        self.send(Method::POST, uri, None).await
    }

    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        self.send_with(method, uri, body, &[]).await
    }

    /// Like [`Self::send`] with extra request headers.
    pub async fn send_with(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        extra_headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .expect("Cookie header is ASCII")
                .split(';')
                .next()
                .unwrap_or_default()
                .to_owned();
            let cleared = pair.ends_with('=');
            self.cookie = if cleared { None } else { Some(pair) };
        }

        let status = response.status();
        let headers = response.headers().clone();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            location,
            body,
        }
    }

    /// Sign in with the harness password.
    pub async fn login(&mut self, email: &str) -> TestResponse {
        self.post(
            "/auth/login",
            serde_json::json!({ "email": email, "password": TEST_PASSWORD }),
        )
        .await
    }
}
