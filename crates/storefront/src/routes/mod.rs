//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (default locale)
//! GET  /{lang}                 - Home page under a locale prefix
//! GET  /search                 - Product search
//! GET  /{lang}/search          - Product search under a locale prefix
//! GET  /health                 - Health check
//!
//! # Cart
//! GET  /cart                   - Cart page
//! GET  /cart/count             - Cart count badge (fragment)
//! POST /cart/add               - Add to cart (returns open drawer, triggers cart-updated)
//! GET  /checkout               - Redirect to Shopify checkout
//!
//! # Shell overlays (HTMX fragments, redirect back without HTMX)
//! POST /shell/cart/open        - Open cart drawer
//! POST /shell/cart/close       - Close cart drawer
//! POST /shell/menu/open        - Open navigation drawer
//! POST /shell/menu/close       - Close navigation drawer
//! POST /shell/menu/follow      - Close navigation drawer and follow a menu item
//! ```
//!
//! Every route that writes the session or calls a Shopify mutation sits
//! behind the per-IP rate limiter.

pub mod cart;
pub mod home;
pub mod search;
pub mod shell;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::mutation_rate_limiter;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route_layer(mutation_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .merge(mutations)
}

/// Create the overlay toggle routes router.
pub fn shell_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/open", post(shell::open_cart))
        .route("/cart/close", post(shell::close_cart))
        .route("/menu/open", post(shell::open_menu))
        .route("/menu/close", post(shell::close_menu))
        .route("/menu/follow", post(shell::follow))
        .route_layer(mutation_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        .route("/{lang}", get(home::home_localized))
        // Search
        .route("/search", get(search::search))
        .route("/{lang}/search", get(search::search_localized))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout redirect
        .route("/checkout", get(cart::checkout))
        // Overlay toggles
        .nest("/shell", shell_routes())
}
