//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Cart IDs are stored in the session and mapped to Shopify carts.

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::models::session;
use crate::shell::overlay::CartLoadingTemplate;
use crate::shell::{
    AddToCartToken, CartBadge, Deferred, Hydration, PageRequest, Shell, ShellView, Slots,
    StreamedPage, cart_drawer, cart_lines,
};
use crate::shopify::types::{Cart, CartLineInput};
use crate::state::AppState;

/// Event HTMX dispatches on `body` after a cart mutation.
pub const CART_UPDATED_TRIGGER: &str = "cart-updated";

/// Cart page template.
#[derive(Template)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub shell: ShellView,
    pub body: String,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
    /// Client-generated id for this add. A fresh one is minted if absent.
    pub token: Option<String>,
}

/// Display cart page.
///
/// This is where the static badge link leads, so it renders without the
/// runtime.
#[instrument(skip(state, request))]
pub async fn show(
    State(state): State<AppState>,
    request: PageRequest,
) -> Result<StreamedPage, AppError> {
    let shell = Shell::load(&state, &request).await;
    let mut slots = Slots::new(request.nonce.clone());

    let loading = crate::shell::overlay::render_logged(&CartLoadingTemplate);
    let body = slots.place(&shell.cart, loading, |cart| cart_lines(cart, false));
    let view = shell.render(&mut slots)?;

    let head = CartShowTemplate { shell: view, body }.render()?;
    Ok(StreamedPage::new(head, slots))
}

/// Get cart count badge (HTMX).
///
/// Served to the live runtime, so the result is always the hydrated button.
#[instrument(skip(state, request))]
pub async fn count(State(state): State<AppState>, request: PageRequest) -> Html<String> {
    let count = match session::cart_id(&request.session).await {
        Some(cart_id) => state
            .storefront()
            .get_cart(&cart_id, &request.locale)
            .await
            .map_err(|e| tracing::warn!(error = %e, "Failed to fetch cart for badge"))
            .ok()
            .flatten()
            .map_or(0, |cart| cart.item_count()),
        None => 0,
    };

    Html(CartBadge::new(request.hydration).render(count))
}

/// Add item to cart.
///
/// Creates a new cart if one doesn't exist, or adds to the existing cart.
/// The add is reported to the header controller as in flight for the
/// duration of the mutation, which opens the cart drawer. HTMX callers get
/// the open drawer plus an `HX-Trigger` that refreshes both badges.
#[instrument(skip(state, request, form), fields(variant_id = %form.variant_id))]
pub async fn add(
    State(state): State<AppState>,
    request: PageRequest,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    if form.variant_id.trim().is_empty() {
        return Err(AppError::BadRequest("variant_id is required".to_string()));
    }

    let token = form
        .token
        .as_deref()
        .and_then(|t| t.parse::<AddToCartToken>().ok())
        .unwrap_or_default();

    let mut header = session::header(&request.session).await;
    if header.observe_add_to_cart(&[token]) {
        add_breadcrumb("cart", "Cart opened by add to cart", None);
    }
    session::save_header(&request.session, &header).await?;

    let result = mutate(&state, &request, form).await;

    header.observe_add_to_cart(&[]);
    session::save_header(&request.session, &header).await?;

    let cart = result?;
    session::set_cart_id(&request.session, &cart.id).await?;

    if request.hydration != Hydration::Hydrated {
        return Ok(Redirect::to("/cart").into_response());
    }

    let mut slots = Slots::new(request.nonce.clone());
    let drawer = cart_drawer(header.is_cart_open(), &Deferred::ready(cart), &mut slots)?;

    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED_TRIGGER)]),
        Html(drawer),
    )
        .into_response())
}

async fn mutate(state: &AppState, request: &PageRequest, form: AddToCartForm) -> Result<Cart, AppError> {
    let line = CartLineInput {
        merchandise_id: form.variant_id,
        quantity: i64::from(form.quantity.unwrap_or(1).max(1)),
    };

    let cart = match session::cart_id(&request.session).await {
        Some(cart_id) => {
            state
                .storefront()
                .add_to_cart(&cart_id, vec![line], &request.locale)
                .await?
        }
        None => {
            state
                .storefront()
                .create_cart(vec![line], &request.locale)
                .await?
        }
    };

    Ok(cart)
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, request))]
pub async fn checkout(State(state): State<AppState>, request: PageRequest) -> Redirect {
    let Some(cart_id) = session::cart_id(&request.session).await else {
        return Redirect::to("/cart");
    };

    match state.storefront().get_cart(&cart_id, &request.locale).await {
        Ok(Some(Cart {
            checkout_url: Some(url),
            ..
        })) => Redirect::to(&url),
        Ok(_) => Redirect::to("/cart"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to get cart for checkout");
            Redirect::to("/cart")
        }
    }
}
