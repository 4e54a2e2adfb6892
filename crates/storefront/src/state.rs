//! Application state shared across handlers.

use std::sync::Arc;

use anydays_core::LocaleNegotiator;

use crate::config::StorefrontConfig;
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the Storefront API client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    negotiator: LocaleNegotiator,
}

impl AppState {
    /// Create a new application state talking to the configured store.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storefront = StorefrontClient::new(&config.shopify);
        Self::with_client(config, storefront)
    }

    /// Create a new application state with a prebuilt Storefront client.
    #[must_use]
    pub fn with_client(config: StorefrontConfig, storefront: StorefrontClient) -> Self {
        let negotiator = config.negotiator();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                negotiator,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the locale negotiator.
    #[must_use]
    pub fn negotiator(&self) -> &LocaleNegotiator {
        &self.inner.negotiator
    }
}
