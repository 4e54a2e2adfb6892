//! Overlay toggle endpoints.
//!
//! HTMX posts here from the badge, the menu button and the drawer close
//! buttons; the response is the re-rendered drawer, swapped in place. A
//! plain form post (no runtime) gets a redirect back to the page it came
//! from, which then renders with the new overlay state.

use anydays_core::Menu;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, header::REFERER},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::models::session;
use crate::shell::overlay::MenuDrawerTemplate;
use crate::shell::{
    Deferred, HeaderController, PageRequest, Slots, cart_drawer, cart_handle, load_layout,
};
use crate::state::AppState;

/// Which drawer an endpoint toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drawer {
    Cart,
    Menu,
}

/// Local path to return to, taken from `Referer`.
///
/// Only the path and query of the referring URL are kept, and a path that
/// would resolve off-site (`//host/...`) falls back to `/`.
#[must_use]
pub fn back_path(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| url::Url::parse(v).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        })
        .filter(|path| is_local_path(path))
        .unwrap_or_else(|| "/".to_owned())
}

/// Whether `to` is a path on this site (not protocol-relative).
#[must_use]
pub fn is_local_path(to: &str) -> bool {
    to.starts_with('/') && !to.starts_with("//") && !to.starts_with("/\\")
}

/// Apply a change to the visitor's header state and persist it.
async fn update_header(
    request: &PageRequest,
    change: impl FnOnce(&mut HeaderController),
) -> Result<HeaderController, AppError> {
    let mut header = session::header(&request.session).await;
    change(&mut header);
    session::save_header(&request.session, &header).await?;
    Ok(header)
}

/// Re-render one drawer for an HTMX swap, or redirect back for a plain post.
async fn respond(
    state: &AppState,
    request: &PageRequest,
    headers: &HeaderMap,
    header: &HeaderController,
    drawer: Drawer,
) -> Result<Response, AppError> {
    if !request.hydration.is_hydrated() {
        return Ok(Redirect::to(&back_path(headers)).into_response());
    }

    match drawer {
        Drawer::Cart => {
            let cart = if header.is_cart_open() {
                cart_handle(
                    state.storefront(),
                    session::cart_id(&request.session).await,
                    &request.locale,
                )
            } else {
                Deferred::empty()
            };
            // Fragments are not streamed
            cart.settled().await;
            let mut slots = Slots::new(request.nonce.clone());
            let html = cart_drawer(header.is_cart_open(), &cart, &mut slots)?;
            Ok(Html(html).into_response())
        }
        Drawer::Menu => {
            let layout = load_layout(
                state.storefront(),
                &request.locale,
                &request.prefix,
                &state.config().shopify.store,
            )
            .await;
            Ok(
                MenuDrawerTemplate::new(header.is_menu_open(), &layout.header_menu, &request.route)
                    .into_response(),
            )
        }
    }
}

/// Open the cart drawer.
#[instrument(skip(state, request, headers))]
pub async fn open_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: PageRequest,
) -> Result<Response, AppError> {
    add_breadcrumb("shell", "Opened cart drawer", None);
    let header = update_header(&request, HeaderController::open_cart).await?;
    respond(&state, &request, &headers, &header, Drawer::Cart).await
}

/// Close the cart drawer.
#[instrument(skip(state, request, headers))]
pub async fn close_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: PageRequest,
) -> Result<Response, AppError> {
    let header = update_header(&request, HeaderController::close_cart).await?;
    respond(&state, &request, &headers, &header, Drawer::Cart).await
}

/// Open the navigation drawer.
#[instrument(skip(state, request, headers))]
pub async fn open_menu(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: PageRequest,
) -> Result<Response, AppError> {
    add_breadcrumb("shell", "Opened menu drawer", None);
    let header = update_header(&request, HeaderController::open_menu).await?;
    respond(&state, &request, &headers, &header, Drawer::Menu).await
}

/// Close the navigation drawer.
#[instrument(skip(state, request, headers))]
pub async fn close_menu(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: PageRequest,
) -> Result<Response, AppError> {
    let header = update_header(&request, HeaderController::close_menu).await?;
    respond(&state, &request, &headers, &header, Drawer::Menu).await
}

/// Form for [`follow`].
#[derive(Debug, Deserialize)]
pub struct FollowForm {
    pub to: String,
}

/// Whether `to` is the exact URL of a top-level header menu item.
fn is_menu_target(menu: &Menu, to: &str) -> bool {
    menu.items.iter().any(|item| item.to == to)
}

/// Close the navigation drawer, then navigate to the chosen item.
///
/// Local paths are followed as-is. An absolute URL is followed only when it
/// is one of the header menu's own items; anything else goes back to the
/// referring page.
#[instrument(skip(state, request, headers, form))]
pub async fn follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: PageRequest,
    Form(form): Form<FollowForm>,
) -> Result<Redirect, AppError> {
    update_header(&request, HeaderController::close_menu).await?;

    if is_local_path(&form.to) {
        return Ok(Redirect::to(&form.to));
    }

    let layout = load_layout(
        state.storefront(),
        &request.locale,
        &request.prefix,
        &state.config().shopify.store,
    )
    .await;

    if is_menu_target(&layout.header_menu, &form.to) {
        Ok(Redirect::to(&form.to))
    } else {
        tracing::debug!(to = %form.to, "Refusing menu redirect outside the menu");
        Ok(Redirect::to(&back_path(&headers)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use anydays_core::{LinkTarget, MenuItem};
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_local_paths() {
        assert!(is_local_path("/collections/all"));
        assert!(is_local_path("/fr-ca"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("/\\evil.example"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path("collections"));
    }

    #[test]
    fn test_menu_targets_are_exact_items() {
        let menu = Menu {
            id: "main".to_owned(),
            items: vec![MenuItem {
                id: "ig".to_owned(),
                title: "Instagram".to_owned(),
                to: "https://instagram.com/anydays".to_owned(),
                target: LinkTarget::Blank,
                is_external: true,
                items: Vec::new(),
            }],
        };

        assert!(is_menu_target(&menu, "https://instagram.com/anydays"));
        assert!(!is_menu_target(&menu, "https://instagram.com/anydays/evil"));
        assert!(!is_menu_target(&menu, "https://evil.example"));
    }

    #[test]
    fn test_back_path_keeps_path_and_query() {
        let mut headers = HeaderMap::new();
        assert_eq!(back_path(&headers), "/");

        headers.insert(
            REFERER,
            HeaderValue::from_static("https://evil.example/search?q=boxer"),
        );
        assert_eq!(back_path(&headers), "/search?q=boxer");

        headers.insert(REFERER, HeaderValue::from_static("not a url"));
        assert_eq!(back_path(&headers), "/");
    }

    #[test]
    fn test_back_path_never_leaves_the_site() {
        let mut headers = HeaderMap::new();
        headers.insert(
            REFERER,
            HeaderValue::from_static("https://evil.example//evil.example/x"),
        );
        assert_eq!(back_path(&headers), "/");

        headers.insert(
            REFERER,
            HeaderValue::from_static("https://evil.example/%2F%2Fevil.example"),
        );
        assert_eq!(back_path(&headers), "/%2F%2Fevil.example");
    }
}
