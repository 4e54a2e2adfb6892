//! Cart badge: the item count shown in both header variants.

use std::sync::{Arc, Mutex, PoisonError};

use axum::{extract::FromRequestParts, http::request::Parts};

/// Header HTMX sets on every request it issues.
pub const HX_REQUEST_HEADER: &str = "hx-request";

/// Whether the client runtime has attached interactive behavior.
///
/// A request issued by HTMX carries `HX-Request: true` and so comes from a
/// live page. A plain navigation does not, and its markup must work without
/// any script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// Interactive runtime present.
    Hydrated,
    /// Plain document load.
    Static,
}

impl Hydration {
    #[must_use]
    pub const fn is_hydrated(self) -> bool {
        matches!(self, Self::Hydrated)
    }
}

impl<S> FromRequestParts<S> for Hydration
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let hydrated = parts
            .headers
            .get(HX_REQUEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(if hydrated {
            Self::Hydrated
        } else {
            Self::Static
        })
    }
}

/// Counter markup memoized against the count alone.
#[derive(Debug, Clone, Default)]
pub struct BadgeCounter {
    last: Arc<Mutex<Option<(u32, Arc<str>)>>>,
}

impl BadgeCounter {
    /// Counter markup for `count`, reusing the previous markup when the count
    /// is unchanged.
    #[must_use]
    pub fn markup(&self, count: u32) -> Arc<str> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match &*last {
            Some((memo_count, markup)) if *memo_count == count => Arc::clone(markup),
            _ => {
                let markup: Arc<str> = Arc::from(format!(r#"<p class="text-sm">BAG {count}</p>"#));
                *last = Some((count, Arc::clone(&markup)));
                markup
            }
        }
    }
}

/// Renders the badge for one page.
#[derive(Debug, Clone)]
pub struct CartBadge {
    hydration: Hydration,
    dark: bool,
    counter: BadgeCounter,
}

impl CartBadge {
    #[must_use]
    pub fn new(hydration: Hydration) -> Self {
        Self {
            hydration,
            dark: false,
            counter: BadgeCounter::default(),
        }
    }

    /// Light-on-dark variant, used over the home page hero.
    #[must_use]
    pub const fn dark(mut self, dark: bool) -> Self {
        self.dark = dark;
        self
    }

    /// Badge markup for `count`.
    ///
    /// Hydrated: a button that opens the cart drawer in place. Static: a link
    /// to the cart page, which the runtime replaces with the button once it
    /// loads.
    #[must_use]
    pub fn render(&self, count: u32) -> String {
        let counter = self.counter.markup(count);
        match self.hydration {
            Hydration::Hydrated => format!(
                r##"<button type="button" class="relative flex focus:ring-primary/5" hx-post="/shell/cart/open" hx-target="#cart-drawer" hx-swap="outerHTML">{counter}</button>"##
            ),
            Hydration::Static => format!(
                r#"<a href="/cart" class="relative flex focus:ring-primary/5">{counter}</a>"#
            ),
        }
    }

    /// Wrapper that refreshes the badge after add-to-cart, and on load when
    /// the page was served without the runtime.
    #[must_use]
    pub fn wrap(&self, inner: &str) -> String {
        let trigger = match self.hydration {
            Hydration::Hydrated => "cart-updated from:body",
            Hydration::Static => "load, cart-updated from:body",
        };
        let class = if self.dark {
            "cart-count text-contrast"
        } else {
            "cart-count text-primary"
        };
        format!(
            r#"<span class="{class}" hx-get="/cart/count" hx-trigger="{trigger}" hx-swap="innerHTML">{inner}</span>"#
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn hydration_of(request: Request<()>) -> Hydration {
        let (mut parts, ()) = request.into_parts();
        Hydration::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_hx_request_means_hydrated() {
        let request = Request::builder()
            .header("HX-Request", "true")
            .body(())
            .unwrap();
        assert_eq!(hydration_of(request).await, Hydration::Hydrated);

        let request = Request::builder().body(()).unwrap();
        assert_eq!(hydration_of(request).await, Hydration::Static);
    }

    #[test]
    fn test_counter_memoized_on_count() {
        let counter = BadgeCounter::default();
        let a = counter.markup(2);
        let b = counter.markup(2);
        assert!(Arc::ptr_eq(&a, &b));

        let c = counter.markup(3);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(&*c, r#"<p class="text-sm">BAG 3</p>"#);
    }

    #[test]
    fn test_hydrated_badge_is_button() {
        let html = CartBadge::new(Hydration::Hydrated).render(4);
        assert!(html.starts_with("<button"));
        assert!(html.contains(r#"hx-post="/shell/cart/open""#));
        assert!(html.contains("BAG 4"));
    }

    #[test]
    fn test_static_badge_links_to_cart() {
        let html = CartBadge::new(Hydration::Static).render(0);
        assert!(html.starts_with(r#"<a href="/cart""#));
        assert!(html.contains("BAG 0"));
    }

    #[test]
    fn test_dark_variant_only_changes_wrapper() {
        let dark = CartBadge::new(Hydration::Static).dark(true);
        assert!(dark.wrap("x").starts_with(r#"<span class="cart-count text-contrast""#));
        assert_eq!(dark.render(1), CartBadge::new(Hydration::Static).render(1));

        let light = CartBadge::new(Hydration::Static);
        assert!(light.wrap("x").starts_with(r#"<span class="cart-count text-primary""#));
    }

    #[test]
    fn test_static_wrapper_refetches_on_load() {
        let badge = CartBadge::new(Hydration::Static);
        assert!(badge.wrap("x").contains(r#"hx-trigger="load, cart-updated from:body""#));
    }
}
