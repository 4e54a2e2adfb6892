//! The page shell: header, overlays, footer and the deferred data pipeline
//! that feeds them.
//!
//! Every full page goes through the same steps:
//!
//! 1. [`PageRequest`] gathers locale, active route, hydration, nonce and
//!    session from the request.
//! 2. [`Shell::load`] starts the cart fetch, then waits on the layout query.
//! 3. The route handler renders its own sections into a [`Slots`] set, then
//!    [`Shell::render`] adds the header and footer.
//! 4. The handler returns a [`StreamedPage`] that writes the document head and
//!    then each slot as it settles.

pub mod badge;
pub mod deferred;
pub mod footer;
pub mod header;
pub mod layout;
pub mod overlay;
pub mod route;
pub mod stream;

use anydays_core::Locale;
use askama::Template;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::de::DeserializeOwned;
use tower_sessions::Session;

pub use badge::{CartBadge, Hydration};
pub use deferred::Deferred;
pub use footer::{FooterAccordion, FooterSection};
pub use header::{AddToCartToken, HeaderController};
pub use layout::{LayoutData, load_layout};
pub use overlay::{NavLink, cart_drawer, cart_lines, menu_drawer, nav_links};
pub use route::{ActiveRoute, RequestLocale, ensure_locale_param};
pub use stream::{Slots, StreamedPage};

use crate::error::AppError;
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::session;
use crate::shopify::{
    QueryDocument, ShopifyError, StorefrontClient, StorefrontQuery, Variables, types::Cart,
};
use crate::state::AppState;

/// Promotional banner shown above the desktop header.
pub const MARQUEE_TEXT: &str = "FREE SAME-DAY SHIPPING ON ALL ORDERS";

/// `Cache-Control` for pages that show a visitor's cart or open drawers.
pub const CACHE_PRIVATE: &str = "private, no-cache";

// =============================================================================
// Request Inputs
// =============================================================================

/// Everything a page render needs from the request.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub locale: Locale,
    /// Locale path prefix (`""` for the default locale).
    pub prefix: String,
    pub route: ActiveRoute,
    pub hydration: Hydration,
    pub nonce: String,
    pub session: Session,
}

impl FromRequestParts<AppState> for PageRequest {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(RequestLocale { locale, prefix }) =
            RequestLocale::from_request_parts(parts, state).await;
        let Ok(route) = ActiveRoute::from_request_parts(parts, state).await;
        let Ok(hydration) = Hydration::from_request_parts(parts, state).await;
        let Ok(CspNonce(nonce)) = CspNonce::from_request_parts(parts, state).await;
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_owned()))?;

        Ok(Self {
            locale,
            prefix,
            route,
            hydration,
            nonce,
            session,
        })
    }
}

// =============================================================================
// Cart Handle
// =============================================================================

/// Deferred handle for the visitor's cart.
///
/// Without a cart id the handle is already settled as absent, so the badge
/// and drawer render inline with no placeholder.
#[must_use]
pub fn cart_handle(client: &StorefrontClient, cart_id: Option<String>, locale: &Locale) -> Deferred<Cart> {
    let Some(cart_id) = cart_id else {
        return Deferred::empty();
    };

    let client = client.clone();
    let locale = locale.clone();
    Deferred::spawn("cart", async move {
        client
            .get_cart(&cart_id, &locale)
            .await?
            .ok_or_else(|| ShopifyError::NotFound(format!("cart {cart_id}")))
    })
}

/// Start a secondary query on its own task.
///
/// A failure settles the handle as absent, which omits the section.
pub fn defer_query<Q, D>(
    client: &Q,
    label: &'static str,
    document: &'static QueryDocument,
    variables: Variables,
    locale: &Locale,
) -> Deferred<D>
where
    Q: StorefrontQuery,
    D: DeserializeOwned + Send + Sync + 'static,
{
    let client = client.clone();
    let locale = locale.clone();
    Deferred::spawn(label, async move {
        client.query::<D>(document, variables, &locale).await
    })
}

// =============================================================================
// Shell
// =============================================================================

/// Loaded shell inputs for one page.
#[derive(Debug, Clone)]
pub struct Shell {
    pub layout: LayoutData,
    pub header: HeaderController,
    pub cart: Deferred<Cart>,
    /// The session holds a cart id.
    pub has_cart: bool,
    pub locale: Locale,
    pub prefix: String,
    pub route: ActiveRoute,
    pub hydration: Hydration,
    pub nonce: String,
}

impl Shell {
    /// Start the cart fetch, then wait for the layout.
    pub async fn load(state: &AppState, request: &PageRequest) -> Self {
        let cart_id = session::cart_id(&request.session).await;
        let has_cart = cart_id.is_some();
        let cart = cart_handle(state.storefront(), cart_id, &request.locale);
        let header = session::header(&request.session).await;
        let layout = load_layout(
            state.storefront(),
            &request.locale,
            &request.prefix,
            &state.config().shopify.store,
        )
        .await;

        Self {
            layout,
            header,
            cart,
            has_cart,
            locale: request.locale.clone(),
            prefix: request.prefix.clone(),
            route: request.route.clone(),
            hydration: request.hydration,
            nonce: request.nonce.clone(),
        }
    }

    /// Whether the rendered shell carries visitor state.
    #[must_use]
    pub const fn is_personalized(&self) -> bool {
        self.has_cart || self.header.is_cart_open() || self.header.is_menu_open()
    }

    /// `public` for the anonymous, all-closed shell; [`CACHE_PRIVATE`]
    /// once the page shows anything from the session.
    #[must_use]
    pub const fn cache_control(&self, public: &'static str) -> &'static str {
        if self.is_personalized() {
            CACHE_PRIVATE
        } else {
            public
        }
    }

    /// Link to the locale's home page.
    #[must_use]
    pub fn home_href(&self) -> String {
        if self.prefix.is_empty() {
            "/".to_owned()
        } else {
            self.prefix.clone()
        }
    }

    /// Render the header and footer, placing the cart into `slots`.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell template fails to render.
    pub fn render(&self, slots: &mut Slots) -> askama::Result<ShellView> {
        let header = self.render_header(slots)?;
        let footer = FooterTemplate {
            sections: FooterAccordion::from_menu(&self.layout.footer_menu)
                .sections()
                .to_vec(),
        }
        .render()?;

        Ok(ShellView {
            title: self.layout.shop_name.clone(),
            html_lang: self.locale.html_lang(),
            nonce: self.nonce.clone(),
            header,
            footer,
        })
    }

    fn render_header(&self, slots: &mut Slots) -> askama::Result<String> {
        let is_home = self.route.is_home(&self.prefix);
        let badge = CartBadge::new(self.hydration).dark(is_home);
        let count = self.cart.map(|cart| Some(cart.item_count()));

        let place_badge = |slots: &mut Slots| {
            let view_badge = badge.clone();
            let inner = slots.place(&count, Some(badge.render(0)), move |count| {
                Some(view_badge.render(count.copied().unwrap_or(0)))
            });
            badge.wrap(&inner)
        };
        let desktop_badge = place_badge(slots);
        let mobile_badge = place_badge(slots);

        HeaderTemplate {
            title: self.layout.shop_name.clone(),
            home_href: self.home_href(),
            search_action: format!("{}/search", self.prefix),
            marquee: MARQUEE_TEXT,
            is_home,
            links: nav_links(&self.layout.header_menu, &self.route),
            desktop_badge,
            mobile_badge,
            menu_open: self.header.is_menu_open(),
            menu_drawer: menu_drawer(
                self.header.is_menu_open(),
                &self.layout.header_menu,
                &self.route,
            )?,
            cart_drawer: cart_drawer(self.header.is_cart_open(), &self.cart, slots)?,
        }
        .render()
    }
}

/// Rendered shell pieces consumed by `layout.html`.
#[derive(Debug, Clone)]
pub struct ShellView {
    pub title: String,
    pub html_lang: String,
    pub nonce: String,
    pub header: String,
    pub footer: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Desktop and mobile header variants plus both drawers.
#[derive(Template)]
#[template(path = "partials/header.html")]
pub struct HeaderTemplate {
    pub title: String,
    pub home_href: String,
    pub search_action: String,
    pub marquee: &'static str,
    /// Home page variant: dark mobile header and badges, `h1` title.
    pub is_home: bool,
    pub links: Vec<NavLink>,
    pub desktop_badge: String,
    pub mobile_badge: String,
    pub menu_open: bool,
    pub menu_drawer: String,
    pub cart_drawer: String,
}

/// Footer accordion, social placeholder and newsletter form.
#[derive(Template)]
#[template(path = "partials/footer.html")]
pub struct FooterTemplate {
    pub sections: Vec<FooterSection>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use anydays_core::{LinkTarget, Menu, MenuItem};

    use super::*;

    fn item(id: &str, to: &str, items: Vec<MenuItem>) -> MenuItem {
        MenuItem {
            id: id.to_owned(),
            title: id.to_uppercase(),
            to: to.to_owned(),
            target: LinkTarget::SelfFrame,
            is_external: false,
            items,
        }
    }

    fn shell(cart: Deferred<Cart>, hydration: Hydration) -> Shell {
        Shell {
            layout: LayoutData {
                shop_name: "Anydays".to_owned(),
                header_menu: Menu {
                    id: "main".to_owned(),
                    items: vec![item("shop", "/collections/all", vec![])],
                },
                footer_menu: Menu {
                    id: "footer".to_owned(),
                    items: vec![
                        item("help", "/pages/help", vec![item("faq", "/pages/faq", vec![])]),
                        item("about", "/pages/about", vec![]),
                    ],
                },
            },
            header: HeaderController::default(),
            cart,
            has_cart: false,
            locale: Locale::parse("en-us").unwrap(),
            prefix: String::new(),
            route: ActiveRoute::new("/collections/all"),
            hydration,
            nonce: "n0nce".to_owned(),
        }
    }

    fn cart(quantity: u32) -> Cart {
        serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Cart/1",
            "totalQuantity": quantity,
            "lines": {"nodes": []}
        }))
        .unwrap()
    }

    #[test]
    fn test_settled_cart_renders_inline() {
        let shell = shell(Deferred::ready(cart(3)), Hydration::Static);
        let mut slots = Slots::new("n0nce");
        let view = shell.render(&mut slots).unwrap();

        assert_eq!(slots.pending(), 0);
        assert_eq!(view.header.matches("BAG 3").count(), 2);
        assert_eq!(view.title, "Anydays");
        assert_eq!(view.html_lang, "en-US");
    }

    #[test]
    fn test_no_cart_shows_zero() {
        let shell = shell(Deferred::empty(), Hydration::Hydrated);
        let mut slots = Slots::new("n0nce");
        let view = shell.render(&mut slots).unwrap();

        assert_eq!(view.header.matches("BAG 0").count(), 2);
        assert!(view.header.contains(r#"hx-post="/shell/cart/open""#));
    }

    #[tokio::test]
    async fn test_pending_cart_badges_show_zero_then_settle() {
        let (tx, rx) = tokio::sync::oneshot::channel::<Cart>();
        let pending = Deferred::spawn("cart", async move { rx.await.map_err(|e| e.to_string()) });
        let shell = shell(pending, Hydration::Static);
        let mut slots = Slots::new("n0nce");
        let view = shell.render(&mut slots).unwrap();

        // Two badges and the drawer body
        assert_eq!(slots.pending(), 3);
        assert_eq!(view.header.matches("BAG 0").count(), 2);

        tx.send(cart(5)).unwrap();
        let page = StreamedPage::new(view.header, slots);
        let chunks: Vec<String> = futures::StreamExt::collect(page.into_chunks()).await;
        let body = chunks.concat();
        assert_eq!(body.matches("BAG 5").count(), 2);
    }

    #[test]
    fn test_header_marks_active_route() {
        let shell = shell(Deferred::empty(), Hydration::Static);
        let mut slots = Slots::new("n0nce");
        let view = shell.render(&mut slots).unwrap();
        assert!(view.header.contains(MARQUEE_TEXT));
        assert!(view.header.contains(r#"aria-current="page""#));
        assert!(view.header.contains(r#"action="/search""#));
    }

    #[test]
    fn test_footer_sections() {
        let shell = shell(Deferred::empty(), Hydration::Static);
        let mut slots = Slots::new("n0nce");
        let view = shell.render(&mut slots).unwrap();
        assert!(view.footer.contains("HELP"));
        assert!(view.footer.contains(r#"data-caret="down""#));
        assert!(view.footer.contains("Instagram+"));
        assert!(view.footer.contains("Subscribe"));
    }

    #[test]
    fn test_visitor_state_makes_page_private() {
        const PUBLIC: &str = "public, max-age=1";
        let mut shell = shell(Deferred::empty(), Hydration::Static);
        assert_eq!(shell.cache_control(PUBLIC), PUBLIC);

        shell.header.open_menu();
        assert_eq!(shell.cache_control(PUBLIC), CACHE_PRIVATE);

        shell.header.close_menu();
        shell.has_cart = true;
        assert_eq!(shell.cache_control(PUBLIC), CACHE_PRIVATE);
    }

    #[test]
    fn test_home_header_variant() {
        let mut shell = shell(Deferred::empty(), Hydration::Static);
        let view = shell.render(&mut Slots::new("n0nce")).unwrap();
        assert!(view.header.contains(r#"<h2 class="font-bold text-center">Anydays</h2>"#));
        assert!(!view.header.contains("<h1"));
        assert_eq!(view.header.matches("cart-count text-primary").count(), 2);

        shell.route = ActiveRoute::new("/");
        let view = shell.render(&mut Slots::new("n0nce")).unwrap();
        assert!(view.header.contains(r#"<h1 class="font-bold text-center">Anydays</h1>"#));
        assert_eq!(view.header.matches("cart-count text-contrast").count(), 2);
        assert!(view.header.contains(r#"data-header="mobile" data-home"#));
    }

    #[test]
    fn test_home_href_uses_prefix() {
        let mut shell = shell(Deferred::empty(), Hydration::Static);
        assert_eq!(shell.home_href(), "/");
        shell.prefix = "/fr-ca".to_owned();
        assert_eq!(shell.home_href(), "/fr-ca");
    }
}
