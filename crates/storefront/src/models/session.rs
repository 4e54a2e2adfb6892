//! Session-related types.
//!
//! Reads are lenient: a missing or undecodable value is treated as absent,
//! so a stale cookie never fails a page.

use tower_sessions::Session;

use crate::shell::HeaderController;

/// Session keys for visitor state.
pub mod keys {
    /// Key for storing the Shopify cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the header's overlay state.
    pub const HEADER: &str = "shell.header";
}

/// Get the cart ID from the session.
pub async fn cart_id(session: &Session) -> Option<String> {
    session
        .get::<String>(keys::CART_ID)
        .await
        .map_err(|e| tracing::warn!(error = %e, "Failed to read cart id from session"))
        .ok()
        .flatten()
}

/// Set the cart ID in the session.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn set_cart_id(
    session: &Session,
    cart_id: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART_ID, cart_id).await
}

/// Load the header controller, defaulting to both overlays closed.
pub async fn header(session: &Session) -> HeaderController {
    session
        .get::<HeaderController>(keys::HEADER)
        .await
        .map_err(|e| tracing::warn!(error = %e, "Failed to read header state from session"))
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Persist the header controller.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn save_header(
    session: &Session,
    header: &HeaderController,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::HEADER, header).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_missing_values_are_absent() {
        let session = session();
        assert_eq!(cart_id(&session).await, None);
        assert_eq!(header(&session).await, HeaderController::default());
    }

    #[tokio::test]
    async fn test_header_round_trips_through_session() {
        let session = session();
        let mut state = HeaderController::default();
        state.open_menu();
        save_header(&session, &state).await.unwrap();

        let loaded = header(&session).await;
        assert!(loaded.is_menu_open());
        assert!(!loaded.is_cart_open());
    }

    #[tokio::test]
    async fn test_undecodable_header_is_default() {
        let session = session();
        session.insert(keys::HEADER, "garbage").await.unwrap();
        assert_eq!(header(&session).await, HeaderController::default());
    }

    #[tokio::test]
    async fn test_cart_id_round_trip() {
        let session = session();
        set_cart_id(&session, "gid://shopify/Cart/1").await.unwrap();
        assert_eq!(cart_id(&session).await.as_deref(), Some("gid://shopify/Cart/1"));
    }
}
