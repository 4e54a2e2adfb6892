//! Slide-in overlays: the cart drawer and the navigation drawer.

use anydays_core::{Menu, MenuItem};
use askama::Template;
use askama_web::WebTemplate;

use super::deferred::Deferred;
use super::route::ActiveRoute;
use super::stream::Slots;
use crate::shopify::types::{Cart, CartLine};

// =============================================================================
// Cart View Models
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: i64,
    pub line_price: String,
    pub image_url: Option<String>,
    pub image_alt: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let merchandise = &line.merchandise;
        Self {
            id: line.id.clone(),
            handle: merchandise.product.handle.clone(),
            title: merchandise.product.title.clone(),
            variant_title: (merchandise.title != "Default Title").then(|| merchandise.title.clone()),
            quantity: line.quantity,
            line_price: line.cost.total_amount.display(),
            image_url: merchandise.image.as_ref().map(|img| img.url.clone()),
            image_alt: merchandise
                .image
                .as_ref()
                .and_then(|img| img.alt_text.clone())
                .unwrap_or_else(|| merchandise.product.title.clone()),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: Option<String>,
    pub item_count: u32,
    pub has_checkout: bool,
}

impl CartView {
    /// View for a settled cart; an absent cart is the empty cart.
    #[must_use]
    pub fn from_cart(cart: Option<&Cart>) -> Self {
        cart.map_or_else(Self::default, |cart| Self {
            lines: cart.lines.nodes.iter().map(CartLineView::from).collect(),
            subtotal: cart.cost.as_ref().map(|c| c.subtotal_amount.display()),
            item_count: cart.item_count(),
            has_checkout: cart.checkout_url.is_some() && !cart.lines.nodes.is_empty(),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Cart Overlay
// =============================================================================

/// Cart line items, rendered in the drawer and on the cart page.
#[derive(Template)]
#[template(path = "partials/cart_lines.html")]
pub struct CartLinesTemplate {
    pub cart: CartView,
    pub in_drawer: bool,
}

/// Placeholder shown while the cart is resolving.
#[derive(Template)]
#[template(path = "partials/cart_loading.html")]
pub struct CartLoadingTemplate;

/// The cart drawer, opening from the right.
#[derive(Template)]
#[template(path = "partials/cart_drawer.html")]
pub struct CartDrawerTemplate {
    pub open: bool,
    pub body: String,
}

/// Render the cart lines for a settled cart.
#[must_use]
pub fn cart_lines(cart: Option<&Cart>, in_drawer: bool) -> Option<String> {
    render_logged(&CartLinesTemplate {
        cart: CartView::from_cart(cart),
        in_drawer,
    })
}

/// Render the cart drawer, placing the deferred cart into `slots`.
///
/// # Errors
///
/// Returns an error if the drawer template fails to render.
pub fn cart_drawer(
    open: bool,
    cart: &Deferred<Cart>,
    slots: &mut Slots,
) -> askama::Result<String> {
    let body = slots.place(cart, render_logged(&CartLoadingTemplate), |cart| {
        cart_lines(cart, true)
    });

    CartDrawerTemplate { open, body }.render()
}

// =============================================================================
// Navigation Overlay
// =============================================================================

/// A rendered menu link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub id: String,
    pub title: String,
    pub href: String,
    pub target: &'static str,
    pub active: bool,
    pub external: bool,
}

impl NavLink {
    #[must_use]
    pub fn new(item: &MenuItem, route: &ActiveRoute) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            href: item.to.clone(),
            target: item.target.as_str(),
            active: route.is_active(&item.to),
            external: item.is_external,
        }
    }
}

/// Links for the top-level menu items.
#[must_use]
pub fn nav_links(menu: &Menu, route: &ActiveRoute) -> Vec<NavLink> {
    menu.items.iter().map(|item| NavLink::new(item, route)).collect()
}

/// The navigation drawer, opening from the left.
///
/// Every item is a form posting to `/shell/menu/follow`, so choosing one
/// closes the drawer before navigating. Served directly as the response to
/// the menu toggles.
#[derive(Template, WebTemplate)]
#[template(path = "partials/menu_drawer.html")]
pub struct MenuDrawerTemplate {
    pub open: bool,
    pub links: Vec<NavLink>,
}

impl MenuDrawerTemplate {
    #[must_use]
    pub fn new(open: bool, menu: &Menu, route: &ActiveRoute) -> Self {
        Self {
            open,
            links: nav_links(menu, route),
        }
    }
}

/// Render the navigation drawer.
///
/// # Errors
///
/// Returns an error if the drawer template fails to render.
pub fn menu_drawer(open: bool, menu: &Menu, route: &ActiveRoute) -> askama::Result<String> {
    MenuDrawerTemplate::new(open, menu, route).render()
}

/// Render a fragment, logging (not propagating) template failures.
pub(crate) fn render_logged(template: &impl Template) -> Option<String> {
    template
        .render()
        .map_err(|e| tracing::error!(error = %e, "Template render failed"))
        .ok()
}
