//! Integration tests for Anydays.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p anydays-integration-tests
//! ```
//!
//! Each test gets its own [`TestApp`]: the real storefront router with its
//! full middleware stack, pointed at a [`FakeStorefront`] that answers
//! GraphQL requests by operation name from a fixture table. An operation with
//! no fixture gets a GraphQL error response, so "this query fails" is spelled
//! by leaving it out.

// Test support: panicking on a broken fixture is the desired failure mode.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anydays_core::Locale;
use anydays_storefront::{
    config::{ShopifyStorefrontConfig, StorefrontConfig},
    shopify::StorefrontClient,
    state::AppState,
};
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    routing::post,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tower::ServiceExt;

/// Address the rate limiter sees for test traffic.
pub const TEST_CLIENT_IP: &str = "203.0.113.7";

// =============================================================================
// Fake Storefront API
// =============================================================================

#[derive(Clone, Default)]
struct Fixtures {
    responses: Arc<Mutex<HashMap<String, Value>>>,
    calls: Arc<Mutex<Vec<Value>>>,
}

/// A Storefront API stand-in served on an ephemeral port.
pub struct FakeStorefront {
    addr: SocketAddr,
    fixtures: Fixtures,
    server: JoinHandle<()>,
}

impl FakeStorefront {
    /// Start serving `responses`, keyed by GraphQL operation name. Each value
    /// is the `data` object returned for that operation.
    pub async fn start(responses: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        let fixtures = Fixtures::default();
        fixtures.responses.lock().unwrap().extend(
            responses
                .into_iter()
                .map(|(operation, data)| (operation.to_owned(), data)),
        );

        let app = Router::new()
            .route("/graphql.json", post(graphql))
            .with_state(fixtures.clone());

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            fixtures,
            server,
        }
    }

    /// GraphQL endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}/graphql.json", self.addr)
    }

    /// Replace (or add) the fixture for one operation.
    pub fn respond(&self, operation: &str, data: Value) {
        self.fixtures
            .responses
            .lock()
            .unwrap()
            .insert(operation.to_owned(), data);
    }

    /// Operation names requested so far, in arrival order.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.fixtures
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|body| body.get("operationName").and_then(Value::as_str))
            .map(str::to_owned)
            .collect()
    }

    /// Variables sent with every request for `operation`.
    #[must_use]
    pub fn variables_for(&self, operation: &str) -> Vec<Value> {
        self.fixtures
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|body| body.get("operationName").and_then(Value::as_str) == Some(operation))
            .map(|body| body.get("variables").cloned().unwrap_or(Value::Null))
            .collect()
    }
}

impl Drop for FakeStorefront {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn graphql(State(fixtures): State<Fixtures>, Json(body): Json<Value>) -> Json<Value> {
    let operation = body
        .get("operationName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    fixtures.calls.lock().unwrap().push(body);

    let data = fixtures.responses.lock().unwrap().get(&operation).cloned();
    Json(data.map_or_else(
        || json!({ "errors": [{ "message": format!("no fixture for {operation}") }] }),
        |data| json!({ "data": data }),
    ))
}

// =============================================================================
// Fixtures
// =============================================================================

/// Storefront config for tests: `en-us` default plus `extra_locales`, query
/// cache disabled.
#[must_use]
pub fn test_config(extra_locales: &[&str]) -> StorefrontConfig {
    StorefrontConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        default_locale: Locale::parse("en-us").unwrap(),
        locales: extra_locales
            .iter()
            .map(|tag| Locale::parse(tag).unwrap())
            .collect(),
        shopify: ShopifyStorefrontConfig {
            store: "anydays.myshopify.com".to_owned(),
            api_version: "2023-04".to_owned(),
            storefront_private_token: SecretString::from("test-private-token"),
            query_cache_ttl: Duration::ZERO,
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A menu item fixture.
#[must_use]
pub fn menu_item(id: &str, title: &str, url: &str, kind: &str, items: Vec<Value>) -> Value {
    json!({ "id": id, "title": title, "url": url, "type": kind, "items": items })
}

/// Layout payload with the given header and footer menu items.
#[must_use]
pub fn layout(shop_name: &str, header_items: Vec<Value>, footer_items: Vec<Value>) -> Value {
    json!({
        "shop": { "name": shop_name, "primaryDomain": { "url": "https://anydays.com" } },
        "headerMenu": { "id": "gid://shopify/Menu/1", "items": header_items },
        "footerMenu": { "id": "gid://shopify/Menu/2", "items": footer_items },
    })
}

/// Layout payload with a small header and footer menu.
#[must_use]
pub fn default_layout() -> Value {
    layout(
        "Anydays",
        vec![
            menu_item("h1", "Shop", "https://anydays.com/collections/all", "CATALOG", vec![]),
            menu_item("h2", "Journal", "https://anydays.com/blogs/journal", "BLOG", vec![]),
            menu_item("h3", "Instagram", "https://instagram.com/anydays", "HTTP", vec![]),
        ],
        vec![menu_item(
            "f1",
            "Help",
            "https://anydays.com/pages/help",
            "PAGE",
            vec![menu_item(
                "f2",
                "Shipping",
                "https://anydays.com/pages/shipping",
                "PAGE",
                vec![],
            )],
        )],
    )
}

/// Primary home payload.
#[must_use]
pub fn homepage_seo(shop_name: &str, hero: Option<Value>) -> Value {
    json!({ "shop": { "name": shop_name, "description": "Everyday underwear" }, "hero": hero })
}

/// Collection hero fixture.
#[must_use]
pub fn hero(handle: &str, title: &str) -> Value {
    json!({ "id": format!("gid://shopify/Collection/{handle}"), "handle": handle, "title": title })
}

/// Cart fixture with one line of `quantity`.
#[must_use]
pub fn cart(id: &str, quantity: i64) -> Value {
    json!({
        "id": id,
        "checkoutUrl": "https://anydays.myshopify.com/cart/c/1",
        "totalQuantity": quantity,
        "cost": { "subtotalAmount": { "amount": "30.0", "currencyCode": "USD" } },
        "lines": { "nodes": [{
            "id": "gid://shopify/CartLine/1",
            "quantity": quantity,
            "cost": {
                "totalAmount": { "amount": "30.0", "currencyCode": "USD" },
                "amountPerQuantity": { "amount": "30.0", "currencyCode": "USD" },
            },
            "merchandise": {
                "id": "gid://shopify/ProductVariant/1",
                "title": "Medium",
                "product": { "handle": "boxer-short", "title": "Boxer Short" },
            },
        }] },
    })
}

/// Fixtures for a home page where every query succeeds.
#[must_use]
pub fn full_home() -> Vec<(&'static str, Value)> {
    vec![
        ("layout", default_layout()),
        ("homepageSeo", homepage_seo("Anydays", Some(hero("freestyle", "Freestyle")))),
        ("collectionHero", json!({ "hero": hero("backcountry", "Backcountry") })),
        (
            "homepageFeaturedProducts",
            json!({ "products": { "nodes": [{
                "id": "gid://shopify/Product/1",
                "title": "Boxer Short",
                "handle": "boxer-short",
                "variants": { "nodes": [{
                    "id": "gid://shopify/ProductVariant/1",
                    "price": { "amount": "30.0", "currencyCode": "USD" },
                }] },
            }] } }),
        ),
        (
            "homepageFeaturedCollections",
            json!({ "collections": { "nodes": [{
                "id": "gid://shopify/Collection/2",
                "title": "Winter",
                "handle": "winter-2022",
                "image": { "url": "https://cdn.shopify.com/winter.jpg", "altText": "Snow" },
            }] } }),
        ),
    ]
}

// =============================================================================
// Test App
// =============================================================================

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// A response header as a string, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The storefront router plus its fake upstream and one visitor's cookie.
pub struct TestApp {
    pub upstream: FakeStorefront,
    router: Router,
    cookie: Mutex<Option<String>>,
}

impl TestApp {
    /// App with the default config and `responses` as upstream fixtures.
    pub async fn new(responses: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self::with_config(test_config(&[]), responses).await
    }

    /// App with an explicit config.
    pub async fn with_config(
        config: StorefrontConfig,
        responses: impl IntoIterator<Item = (&'static str, Value)>,
    ) -> Self {
        let upstream = FakeStorefront::start(responses).await;
        let client = StorefrontClient::with_endpoint(&config.shopify, upstream.endpoint());
        let router = anydays_storefront::app(AppState::with_client(config, client));

        Self {
            upstream,
            router,
            cookie: Mutex::new(None),
        }
    }

    /// Send a request as this visitor, carrying and updating the session
    /// cookie, and buffer the whole (possibly streamed) body.
    pub async fn send(&self, mut request: Request<Body>) -> TestResponse {
        let cookie = self.cookie.lock().unwrap().clone();
        if let Some(cookie) = cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        request
            .headers_mut()
            .insert("x-forwarded-for", TEST_CLIENT_IP.parse().unwrap());

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            *self.cookie.lock().unwrap() = Some(set_cookie.to_owned());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    /// Plain GET, as a browser without the runtime would send it.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// GET from the live runtime.
    pub async fn htmx_get(&self, path: &str) -> TestResponse {
        self.send(
            Request::get(path)
                .header("HX-Request", "true")
                .header("HX-Current-URL", "http://localhost:3000/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Form POST from the live runtime.
    pub async fn htmx_post(&self, path: &str, form: &str) -> TestResponse {
        self.send(
            Request::post(path)
                .header("HX-Request", "true")
                .header("HX-Current-URL", "http://localhost:3000/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_owned()))
                .unwrap(),
        )
        .await
    }

    /// Form POST without the runtime, sent from the search page.
    pub async fn post(&self, path: &str, form: &str) -> TestResponse {
        self.post_from(path, form, "http://localhost:3000/search?q=boxer")
            .await
    }

    /// Form POST without the runtime, with the given `Referer`.
    pub async fn post_from(&self, path: &str, form: &str, referer: &str) -> TestResponse {
        self.send(
            Request::post(path)
                .header(header::REFERER, referer)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_owned()))
                .unwrap(),
        )
        .await
    }
}
