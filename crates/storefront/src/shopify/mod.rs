//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Query documents are plain GraphQL sent through `graphql_client`'s
//!   request/response envelope
//! - Shopify is source of truth: cart state lives in the API, the session
//!   only holds the cart ID
//! - Cacheable payloads (layout, heroes, products, collections) are held in
//!   a `moka` cache keyed by operation, locale and variables
//!
//! # Example
//!
//! ```rust,ignore
//! use anydays_storefront::shopify::{queries, StorefrontClient, StorefrontQuery, Variables};
//!
//! let client = StorefrontClient::new(&config.shopify);
//! let layout: LayoutPayload = client
//!     .query(&queries::LAYOUT, Variables::new(), &locale)
//!     .await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::{CachePolicy, QueryDocument, StorefrontClient, StorefrontQuery, Variables, queries};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            // Include message if present
            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            // Include path if present
            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            // Include location if present
            if !e.locations.is_empty() {
                let loc = &e.locations[0];
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
