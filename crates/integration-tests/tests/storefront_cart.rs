//! Integration tests for the cart badge, add-to-cart and the overlay
//! toggles, driven through one visitor's session.

use anydays_integration_tests::{TestApp, cart, full_home};
use axum::http::StatusCode;
use serde_json::{Value, json};

const CART_ID: &str = "gid://shopify/Cart/1";
const ADD_FORM: &str = "variant_id=gid%3A%2F%2Fshopify%2FProductVariant%2F1&quantity=1";

const CART_OPEN: &str = r#"id="cart-drawer" class="drawer drawer-right" data-open="true""#;
const CART_CLOSED: &str = r#"id="cart-drawer" class="drawer drawer-right" data-open="false""#;
const MENU_OPEN: &str = r#"id="menu-drawer" class="drawer drawer-left" data-open="true""#;
const MENU_CLOSED: &str = r#"id="menu-drawer" class="drawer drawer-left" data-open="false""#;

/// Home page fixtures plus a cart that reads back with three items.
fn fixtures() -> Vec<(&'static str, Value)> {
    let mut fixtures = full_home();
    fixtures.extend([
        (
            "cartCreate",
            json!({ "cartCreate": { "cart": cart(CART_ID, 1), "userErrors": [] } }),
        ),
        (
            "cartLinesAdd",
            json!({ "cartLinesAdd": { "cart": cart(CART_ID, 2), "userErrors": [] } }),
        ),
        ("cart", json!({ "cart": cart(CART_ID, 3) })),
    ]);
    fixtures
}

// =============================================================================
// Badge
// =============================================================================

#[tokio::test]
async fn test_badge_without_cart_is_zero() {
    let app = TestApp::new(fixtures()).await;

    let response = app.htmx_get("/cart/count").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.starts_with("<button"));
    assert!(response.body.contains("BAG 0"));
    assert!(!app.upstream.operations().iter().any(|o| o == "cart"));
}

#[tokio::test]
async fn test_badge_shows_cart_quantity() {
    let app = TestApp::new(fixtures()).await;
    app.htmx_post("/cart/add", ADD_FORM).await;

    let response = app.htmx_get("/cart/count").await;
    assert!(response.body.contains("BAG 3"));

    let page = app.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body.matches("BAG 3").count(), 2);
    assert!(page.body.contains(r#"<a href="/cart""#));
}

#[tokio::test]
async fn test_badge_with_unreadable_cart_is_zero() {
    let mut fixtures = fixtures();
    fixtures.retain(|(name, _)| *name != "cart");
    let app = TestApp::new(fixtures).await;
    app.htmx_post("/cart/add", ADD_FORM).await;

    let response = app.htmx_get("/cart/count").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("BAG 0"));
}

// =============================================================================
// Add to Cart
// =============================================================================

#[tokio::test]
async fn test_add_opens_cart_drawer() {
    let app = TestApp::new(fixtures()).await;

    let response = app.htmx_post("/cart/add", ADD_FORM).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("hx-trigger"), Some("cart-updated"));
    assert!(response.body.contains(CART_OPEN));
    assert!(response.body.contains("Boxer Short"));

    let created = app.upstream.variables_for("cartCreate");
    assert_eq!(created.len(), 1);
    assert_eq!(
        created[0]["input"]["lines"][0]["merchandiseId"],
        "gid://shopify/ProductVariant/1"
    );
    assert_eq!(created[0]["input"]["lines"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_second_add_reuses_cart() {
    let app = TestApp::new(fixtures()).await;
    app.htmx_post("/cart/add", ADD_FORM).await;
    app.htmx_post("/cart/add", ADD_FORM).await;

    assert_eq!(app.upstream.variables_for("cartCreate").len(), 1);
    let added = app.upstream.variables_for("cartLinesAdd");
    assert_eq!(added.len(), 1);
    assert_eq!(added[0]["cartId"], CART_ID);
}

#[tokio::test]
async fn test_add_reopens_closed_cart() {
    let app = TestApp::new(fixtures()).await;
    app.htmx_post("/cart/add", ADD_FORM).await;

    let closed = app.htmx_post("/shell/cart/close", "").await;
    assert!(closed.body.contains(CART_CLOSED));

    let response = app.htmx_post("/cart/add", ADD_FORM).await;
    assert!(response.body.contains(CART_OPEN));
}

#[tokio::test]
async fn test_add_without_runtime_redirects_to_cart_page() {
    let app = TestApp::new(fixtures()).await;

    let response = app.post("/cart/add", ADD_FORM).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/cart"));

    let page = app.get("/cart").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Boxer Short"));
    assert!(page.body.ends_with("</body></html>"));
}

#[tokio::test]
async fn test_add_requires_variant() {
    let app = TestApp::new(fixtures()).await;
    let response = app.htmx_post("/cart/add", "variant_id=&quantity=1").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_upstream_failure_is_bad_gateway() {
    let mut fixtures = fixtures();
    fixtures.retain(|(name, _)| *name != "cartCreate");
    let app = TestApp::new(fixtures).await;

    let response = app.htmx_post("/cart/add", ADD_FORM).await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);

    let count = app.htmx_get("/cart/count").await;
    assert!(count.body.contains("BAG 0"));
}

#[tokio::test]
async fn test_home_with_cart_is_private() {
    let app = TestApp::new(fixtures()).await;
    app.htmx_post("/cart/add", ADD_FORM).await;

    let page = app.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(CART_OPEN));
    assert!(page.body.contains("Boxer Short"));
    assert_eq!(page.header("cache-control"), Some("private, no-cache"));
}

#[tokio::test]
async fn test_home_with_open_menu_is_private() {
    let app = TestApp::new(fixtures()).await;
    let anonymous = app.get("/").await;
    assert!(anonymous.header("cache-control").unwrap().starts_with("public"));

    app.htmx_post("/shell/menu/open", "").await;
    let page = app.get("/").await;
    assert_eq!(page.header("cache-control"), Some("private, no-cache"));

    app.htmx_post("/shell/menu/close", "").await;
    let page = app.get("/").await;
    assert!(page.header("cache-control").unwrap().starts_with("public"));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_without_cart_goes_to_cart_page() {
    let app = TestApp::new(fixtures()).await;
    let response = app.get("/checkout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/cart"));
}

#[tokio::test]
async fn test_checkout_redirects_to_shopify() {
    let app = TestApp::new(fixtures()).await;
    app.htmx_post("/cart/add", ADD_FORM).await;

    let response = app.get("/checkout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location"),
        Some("https://anydays.myshopify.com/cart/c/1")
    );
}

// =============================================================================
// Overlays
// =============================================================================

#[tokio::test]
async fn test_overlays_start_closed() {
    let app = TestApp::new(fixtures()).await;
    let page = app.get("/").await;
    assert!(page.body.contains(CART_CLOSED));
    assert!(page.body.contains(MENU_CLOSED));
}

#[tokio::test]
async fn test_cart_and_menu_are_independent() {
    let app = TestApp::new(fixtures()).await;

    let menu = app.htmx_post("/shell/menu/open", "").await;
    assert_eq!(menu.status, StatusCode::OK);
    assert!(menu.body.contains(MENU_OPEN));
    assert!(menu.body.contains("Journal"));

    let cart = app.htmx_post("/shell/cart/open", "").await;
    assert!(cart.body.contains(CART_OPEN));

    let page = app.get("/").await;
    assert!(page.body.contains(MENU_OPEN));
    assert!(page.body.contains(CART_OPEN));

    app.htmx_post("/shell/cart/close", "").await;
    let page = app.get("/").await;
    assert!(page.body.contains(MENU_OPEN));
    assert!(page.body.contains(CART_CLOSED));

    app.htmx_post("/shell/menu/close", "").await;
    let page = app.get("/").await;
    assert!(page.body.contains(MENU_CLOSED));
    assert!(page.body.contains(CART_CLOSED));
}

#[tokio::test]
async fn test_toggle_without_runtime_redirects_back() {
    let app = TestApp::new(fixtures()).await;

    let response = app.post("/shell/menu/open", "").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/search?q=boxer"));

    let page = app.get("/").await;
    assert!(page.body.contains(MENU_OPEN));
}

#[tokio::test]
async fn test_toggle_with_off_site_referer_goes_home() {
    let app = TestApp::new(fixtures()).await;

    let response = app
        .post_from(
            "/shell/menu/open",
            "",
            "https://evil.example//evil.example/x",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/"));
}

#[tokio::test]
async fn test_follow_closes_menu() {
    let app = TestApp::new(fixtures()).await;
    app.htmx_post("/shell/menu/open", "").await;

    let response = app.post("/shell/menu/follow", "to=%2Fcollections%2Fall").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/collections/all"));

    let page = app.get("/").await;
    assert!(page.body.contains(MENU_CLOSED));
}

#[tokio::test]
async fn test_follow_external_menu_item_closes_menu() {
    let app = TestApp::new(fixtures()).await;
    let drawer = app.htmx_post("/shell/menu/open", "").await;
    assert!(drawer.body.contains(r#"value="https://instagram.com/anydays""#));

    let response = app
        .post("/shell/menu/follow", "to=https%3A%2F%2Finstagram.com%2Fanydays")
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location"),
        Some("https://instagram.com/anydays")
    );

    let page = app.get("/").await;
    assert!(page.body.contains(MENU_CLOSED));
}

#[tokio::test]
async fn test_follow_refuses_targets_outside_the_menu() {
    let app = TestApp::new(fixtures()).await;
    let response = app
        .post("/shell/menu/follow", "to=https%3A%2F%2Fevil.example")
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/search?q=boxer"));

    let response = app
        .post_from(
            "/shell/menu/follow",
            "to=https%3A%2F%2Fevil.example",
            "https://evil.example//evil.example/x",
        )
        .await;
    assert_eq!(response.header("location"), Some("/"));
}

#[tokio::test]
async fn test_follow_is_post_only() {
    let app = TestApp::new(fixtures()).await;
    let response = app.get("/shell/menu/follow?to=/collections/all").await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}
