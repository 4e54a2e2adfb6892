//! Search route handlers.
//!
//! Target of the header search form. Results come from a single uncached
//! product search and render in the page shell like any other page.

use askama::Template;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::sections::{ProductCardView, product_cards};
use crate::shell::{PageRequest, Shell, ShellView, Slots, StreamedPage, ensure_locale_param};
use crate::shopify::{StorefrontQuery, Variables, queries, types::ProductsPayload};
use crate::state::AppState;

/// Maximum number of products shown for one search.
pub const RESULTS_PER_PAGE: usize = 24;

/// Search page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search results page template.
#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub shell: ShellView,
    pub term: String,
    pub products: Vec<ProductCardView>,
}

/// Run a product search. An empty term skips the query.
///
/// # Errors
///
/// Returns an error if the Storefront API request fails.
#[instrument(skip(client, request))]
pub async fn search_products<Q: StorefrontQuery>(
    client: &Q,
    request: &PageRequest,
    term: &str,
) -> Result<Vec<ProductCardView>, AppError> {
    if term.is_empty() {
        return Ok(Vec::new());
    }

    let variables = Variables::new()
        .with("searchTerm", term)
        .with("first", RESULTS_PER_PAGE);

    let payload: ProductsPayload = client
        .query(&queries::PRODUCT_SEARCH, variables, &request.locale)
        .await?;

    let nodes = payload.products.map(|c| c.nodes).unwrap_or_default();
    Ok(product_cards(&nodes, RESULTS_PER_PAGE, &request.prefix))
}

/// Search page for the default locale.
#[instrument(skip(state, request, query), fields(q = %query.q))]
pub async fn search(
    State(state): State<AppState>,
    request: PageRequest,
    Query(query): Query<SearchQuery>,
) -> Result<StreamedPage, AppError> {
    serve_search(&state, None, request, query).await
}

/// Search page under a locale prefix.
#[instrument(skip(state, request, query), fields(q = %query.q))]
pub async fn search_localized(
    State(state): State<AppState>,
    Path(lang): Path<String>,
    request: PageRequest,
    Query(query): Query<SearchQuery>,
) -> Result<StreamedPage, AppError> {
    serve_search(&state, Some(&lang), request, query).await
}

async fn serve_search(
    state: &AppState,
    lang: Option<&str>,
    request: PageRequest,
    query: SearchQuery,
) -> Result<StreamedPage, AppError> {
    ensure_locale_param(lang, &request.locale)?;

    let term = query.q.trim().to_owned();
    let (shell, products) = tokio::join!(
        Shell::load(state, &request),
        search_products(state.storefront(), &request, &term)
    );
    let products = products?;

    let mut slots = Slots::new(request.nonce.clone());
    let head = SearchTemplate {
        shell: shell.render(&mut slots)?,
        term,
        products,
    }
    .render()?;

    Ok(StreamedPage::new(head, slots))
}
