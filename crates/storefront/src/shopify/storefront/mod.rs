//! Shopify Storefront API client implementation.
//!
//! Sends plain GraphQL documents through `graphql_client`'s request and
//! response envelope with `reqwest` 0.13 for HTTP. Cacheable payloads are
//! held in `moka` for the configured query TTL.

mod cache;
pub mod queries;

use std::future::Future;
use std::sync::Arc;

use anydays_core::Locale;
use graphql_client::{QueryBody, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartCreatePayload, CartLineInput, CartLinesAddPayload, CartMutationResult, CartPayload,
};

use cache::{CacheKey, CacheValue};
pub use queries::{CachePolicy, QueryDocument};

// =============================================================================
// Variables
// =============================================================================

/// GraphQL variables for a single request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Variables(serde_json::Map<String, serde_json::Value>);

impl Variables {
    /// Empty variable set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(name.to_owned(), value.into());
        self
    }

    /// Add `$country` and `$language` if the document declares them and the
    /// caller has not set them already.
    fn localize(&mut self, document: &QueryDocument, locale: &Locale) {
        if !document.is_localized() {
            return;
        }
        if document.declares("country") {
            self.0
                .entry("country")
                .or_insert_with(|| locale.country().into());
        }
        if document.declares("language") {
            self.0
                .entry("language")
                .or_insert_with(|| locale.language().into());
        }
    }

    fn cache_fragment(&self) -> String {
        serde_json::Value::Object(self.0.clone()).to_string()
    }
}

// =============================================================================
// StorefrontQuery
// =============================================================================

/// The commerce query collaborator: a document plus locale and variables in,
/// a typed payload (or [`ShopifyError`]) out.
pub trait StorefrontQuery: Clone + Send + Sync + 'static {
    /// Run `document` in `locale`'s context and decode its `data` as `D`.
    fn query<D>(
        &self,
        document: &'static QueryDocument,
        variables: Variables,
        locale: &Locale,
    ) -> impl Future<Output = Result<D, ShopifyError>> + Send
    where
        D: DeserializeOwned + Send + 'static;
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        Self::with_endpoint(config, config.endpoint())
    }

    /// Create a client that posts to `endpoint` instead of the store's API URL.
    #[must_use]
    pub fn with_endpoint(config: &ShopifyStorefrontConfig, endpoint: String) -> Self {
        let cache = (!config.query_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.query_cache_ttl)
                .build()
        });

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint,
                access_token: config.storefront_private_token.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL document and return its raw `data` object.
    async fn execute(
        &self,
        document: &'static QueryDocument,
        variables: &Variables,
    ) -> Result<serde_json::Value, ShopifyError> {
        let request_body = QueryBody {
            variables,
            query: document.source,
            operation_name: document.operation_name,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = document.operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![super::GraphQLError {
                message: format!(
                    "HTTP {status}: {}",
                    response_text.chars().take(200).collect::<String>()
                ),
                locations: vec![],
                path: vec![],
            }]));
        }

        let response: Response<serde_json::Value> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = document.operation_name,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        match response.data {
            Some(data) if !data.is_null() => Ok(data),
            _ => {
                tracing::error!(
                    operation = document.operation_name,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Shopify GraphQL response has no data and no errors"
                );
                Err(ShopifyError::GraphQL(vec![super::GraphQLError {
                    message: "No data in response".to_string(),
                    locations: vec![],
                    path: vec![],
                }]))
            }
        }
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get a cart by ID. Returns `None` for unknown or expired carts.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, locale), fields(cart_id = %cart_id))]
    pub async fn get_cart(
        &self,
        cart_id: &str,
        locale: &Locale,
    ) -> Result<Option<Cart>, ShopifyError> {
        let payload: CartPayload = self
            .query(&queries::CART, Variables::new().with("cartId", cart_id), locale)
            .await?;
        Ok(payload.cart)
    }

    /// Create a cart holding `lines`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or Shopify rejects the input.
    #[instrument(skip(self, lines, locale))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        locale: &Locale,
    ) -> Result<Cart, ShopifyError> {
        let input = serde_json::json!({ "lines": lines });
        let payload: CartCreatePayload = self
            .query(&queries::CART_CREATE, Variables::new().with("input", input), locale)
            .await?;
        mutation_cart(payload.cart_create)
    }

    /// Add lines to an existing cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or Shopify rejects the input.
    #[instrument(skip(self, lines, locale), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
        locale: &Locale,
    ) -> Result<Cart, ShopifyError> {
        let variables = Variables::new()
            .with("cartId", cart_id)
            .with("lines", serde_json::to_value(lines)?);
        let payload: CartLinesAddPayload = self
            .query(&queries::CART_LINES_ADD, variables, locale)
            .await?;
        mutation_cart(payload.cart_lines_add)
    }
}

impl StorefrontQuery for StorefrontClient {
    #[instrument(skip(self, document, variables, locale), fields(operation = document.operation_name, locale = %locale))]
    async fn query<D>(
        &self,
        document: &'static QueryDocument,
        mut variables: Variables,
        locale: &Locale,
    ) -> Result<D, ShopifyError>
    where
        D: DeserializeOwned + Send + 'static,
    {
        variables.localize(document, locale);

        let cache = self
            .inner
            .cache
            .as_ref()
            .filter(|_| document.cache == CachePolicy::Short);

        let key = CacheKey {
            operation: document.operation_name,
            locale: locale.tag(),
            variables: variables.cache_fragment(),
        };

        if let Some(cache) = cache
            && let Some(data) = cache.get(&key).await
        {
            debug!("Cache hit");
            return Ok(serde_json::from_value(data)?);
        }

        let data = self.execute(document, &variables).await?;
        let decoded = D::deserialize(&data).map_err(|e| {
            tracing::error!(error = %e, "Shopify payload did not match the expected shape");
            ShopifyError::Parse(e)
        })?;

        if let Some(cache) = cache {
            cache.insert(key, data).await;
        }

        Ok(decoded)
    }
}

fn mutation_cart(result: Option<CartMutationResult>) -> Result<Cart, ShopifyError> {
    let result = result.ok_or_else(|| ShopifyError::NotFound("cart mutation result".to_string()))?;

    if let Some(error) = result.user_errors.first() {
        return Err(ShopifyError::UserError(error.message.clone()));
    }

    result
        .cart
        .ok_or_else(|| ShopifyError::NotFound("cart".to_string()))
}

fn convert_graphql_error(e: graphql_client::Error) -> super::GraphQLError {
    super::GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| super::GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::shopify::types::CartUserError;

    fn locale() -> Locale {
        Locale::parse("fr-ca").unwrap()
    }

    #[test]
    fn test_localize_injects_country_and_language() {
        let mut vars = Variables::new().with("handle", "freestyle");
        vars.localize(&queries::HOMEPAGE_SEO, &locale());

        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json["country"], "CA");
        assert_eq!(json["language"], "FR");
        assert_eq!(json["handle"], "freestyle");
    }

    #[test]
    fn test_localize_only_declared_variables() {
        let mut vars = Variables::new();
        vars.localize(&queries::LAYOUT, &locale());

        let json = serde_json::to_value(&vars).unwrap();
        assert!(json.get("country").is_none());
        assert_eq!(json["language"], "FR");
    }

    #[test]
    fn test_localize_keeps_caller_values() {
        let mut vars = Variables::new().with("country", "US");
        vars.localize(&queries::FEATURED_PRODUCTS, &locale());

        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json["country"], "US");
    }

    #[test]
    fn test_mutation_cart_user_error() {
        let result = CartMutationResult {
            cart: None,
            user_errors: vec![CartUserError {
                message: "Merchandise does not exist".to_string(),
                code: Some("INVALID".to_string()),
            }],
        };
        let err = mutation_cart(Some(result)).unwrap_err();
        assert_eq!(err.to_string(), "User error: Merchandise does not exist");
    }

    #[test]
    fn test_mutation_cart_missing_result() {
        assert!(matches!(
            mutation_cart(None),
            Err(ShopifyError::NotFound(_))
        ));
    }
}
