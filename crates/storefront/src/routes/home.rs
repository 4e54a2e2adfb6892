//! Home page route handler.
//!
//! The primary query (shop plus the `freestyle` hero) gates the first byte.
//! Featured products, the two lower heroes and featured collections start on
//! their own tasks before that and stream in as they settle.

use anydays_core::Locale;
use askama::Template;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::AppError;
use crate::sections::{
    HeroPlacement, hero_skeleton, render_collections, render_hero, render_hero_payload,
    render_swimlane,
};
use crate::shell::{
    Deferred, PageRequest, Shell, ShellView, Slots, StreamedPage, defer_query, ensure_locale_param,
};
use crate::shopify::{
    StorefrontQuery, Variables, queries,
    types::{CollectionHero, CollectionsPayload, HeroPayload, HomeSeoPayload, ProductsPayload, Shop},
};
use crate::state::AppState;

/// `Cache-Control` for the anonymous home page.
pub const CACHE_SHORT: &str = "public, max-age=1, stale-while-revalidate=9";

/// Collection handle for the hero that gates first paint.
pub const PRIMARY_HERO_HANDLE: &str = "freestyle";

/// Collection handle for the hero below the product swimlane.
pub const SECONDARY_HERO_HANDLE: &str = "backcountry";

/// Collection handle for the hero at the bottom of the page.
pub const TERTIARY_HERO_HANDLE: &str = "winter-2022";

// =============================================================================
// Data
// =============================================================================

/// Home page data: resolved primary payload plus deferred sections.
#[derive(Debug)]
pub struct HomeData {
    pub shop: Shop,
    pub primary_hero: Option<CollectionHero>,
    pub featured_products: Deferred<ProductsPayload>,
    pub secondary_hero: Deferred<HeroPayload>,
    pub featured_collections: Deferred<CollectionsPayload>,
    pub tertiary_hero: Deferred<HeroPayload>,
}

/// Start the deferred queries, then wait on the primary one.
///
/// # Errors
///
/// Returns an error if the primary query fails. The deferred handles are
/// dropped with it, which cancels their tasks.
#[instrument(skip(client, locale), fields(locale = %locale))]
pub async fn load_home<Q: StorefrontQuery>(client: &Q, locale: &Locale) -> Result<HomeData, AppError> {
    let by_handle = |handle: &str| Variables::new().with("handle", handle);

    let featured_products = defer_query(
        client,
        "featured_products",
        &queries::FEATURED_PRODUCTS,
        Variables::new(),
        locale,
    );
    let secondary_hero = defer_query(
        client,
        "secondary_hero",
        &queries::COLLECTION_HERO,
        by_handle(SECONDARY_HERO_HANDLE),
        locale,
    );
    let featured_collections = defer_query(
        client,
        "featured_collections",
        &queries::FEATURED_COLLECTIONS,
        Variables::new(),
        locale,
    );
    let tertiary_hero = defer_query(
        client,
        "tertiary_hero",
        &queries::COLLECTION_HERO,
        by_handle(TERTIARY_HERO_HANDLE),
        locale,
    );

    let HomeSeoPayload { shop, hero } = client
        .query(&queries::HOMEPAGE_SEO, by_handle(PRIMARY_HERO_HANDLE), locale)
        .await?;

    Ok(HomeData {
        shop,
        primary_hero: hero,
        featured_products,
        secondary_hero,
        featured_collections,
        tertiary_hero,
    })
}

// =============================================================================
// Rendering
// =============================================================================

/// Home page template.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub shell: ShellView,
    pub description: Option<String>,
    pub primary_hero: Option<String>,
    pub featured_products: String,
    pub secondary_hero: String,
    pub featured_collections: String,
    pub tertiary_hero: String,
}

/// Render the page head and register the deferred sections in `slots`.
///
/// # Errors
///
/// Returns an error if a template fails to render.
pub fn render_home(shell: &Shell, data: &HomeData, slots: &mut Slots) -> Result<String, AppError> {
    let prefix = shell.prefix.clone();

    let primary_hero = render_hero(data.primary_hero.as_ref(), HeroPlacement::Primary, &prefix);

    let p = prefix.clone();
    let featured_products = slots.place(&data.featured_products, None, move |payload| {
        render_swimlane(payload, "", &p)
    });
    let p = prefix.clone();
    let secondary_hero = slots.place(&data.secondary_hero, hero_skeleton(), move |payload| {
        render_hero_payload(payload, &p)
    });
    let p = prefix.clone();
    let featured_collections = slots.place(&data.featured_collections, None, move |payload| {
        render_collections(payload, "Collections", &p)
    });
    let tertiary_hero = slots.place(&data.tertiary_hero, hero_skeleton(), move |payload| {
        render_hero_payload(payload, &prefix)
    });

    let shell = shell.render(slots)?;

    Ok(HomeTemplate {
        shell,
        description: data.shop.description.clone(),
        primary_hero,
        featured_products,
        secondary_hero,
        featured_collections,
        tertiary_hero,
    }
    .render()?)
}

// =============================================================================
// Handlers
// =============================================================================

/// Home page for the default locale.
#[instrument(skip(state, request), fields(path = %request.route.path()))]
pub async fn home(State(state): State<AppState>, request: PageRequest) -> Result<StreamedPage, AppError> {
    serve_home(&state, None, request).await
}

/// Home page under a locale prefix. An unknown or mismatched locale is a 404.
#[instrument(skip(state, request), fields(path = %request.route.path()))]
pub async fn home_localized(
    State(state): State<AppState>,
    Path(lang): Path<String>,
    request: PageRequest,
) -> Result<StreamedPage, AppError> {
    serve_home(&state, Some(&lang), request).await
}

async fn serve_home(
    state: &AppState,
    lang: Option<&str>,
    request: PageRequest,
) -> Result<StreamedPage, AppError> {
    ensure_locale_param(lang, &request.locale)?;

    let (shell, data) = tokio::join!(
        Shell::load(state, &request),
        load_home(state.storefront(), &request.locale)
    );
    let data = data?;

    let mut slots = Slots::new(request.nonce.clone());
    let head = render_home(&shell, &data, &mut slots)?;

    Ok(StreamedPage::new(head, slots).cache_control(shell.cache_control(CACHE_SHORT)))
}
