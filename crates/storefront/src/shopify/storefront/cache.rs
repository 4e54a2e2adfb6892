//! Cache types for Storefront API responses.

/// Cache key for a query payload.
///
/// Locale is part of the key because `@inContext` changes prices, titles and
/// menu labels.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub operation: &'static str,
    pub locale: String,
    pub variables: String,
}

/// Cached value: the raw `data` object, decoded per caller.
pub type CacheValue = serde_json::Value;
