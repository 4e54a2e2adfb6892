//! Domain models for storefront.
//!
//! The storefront keeps no database of its own. The only per-visitor state
//! is what lives in the session: the Shopify cart id and the header's
//! overlay flags.

pub mod session;

pub use session::keys as session_keys;
