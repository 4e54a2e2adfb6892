//! Layout data: shop name and the two navigation menus.

use anydays_core::{Locale, Menu, MenuContext};
use tracing::instrument;

use crate::shopify::{StorefrontQuery, Variables, queries, types::LayoutPayload};

/// Menu handle for the header navigation.
pub const HEADER_MENU_HANDLE: &str = "main-menu";

/// Menu handle for the footer navigation.
pub const FOOTER_MENU_HANDLE: &str = "footer";

/// Title shown when the shop name is unavailable.
pub const FALLBACK_SHOP_NAME: &str = "Hydrogen";

/// Shop name plus parsed menus for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutData {
    pub shop_name: String,
    pub header_menu: Menu,
    pub footer_menu: Menu,
}

impl LayoutData {
    /// Layout used when the shop cannot be loaded.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            shop_name: FALLBACK_SHOP_NAME.to_owned(),
            header_menu: Menu::default(),
            footer_menu: Menu::default(),
        }
    }

    /// Parse a layout payload. Menu URLs on `store_domain` or the shop's
    /// primary domain become local paths under `locale_prefix`.
    #[must_use]
    pub fn from_payload(payload: LayoutPayload, store_domain: &str, locale_prefix: &str) -> Self {
        let shop_name = payload
            .shop
            .as_ref()
            .map(|shop| shop.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_SHOP_NAME)
            .to_owned();

        let primary = payload
            .shop
            .as_ref()
            .and_then(|shop| shop.primary_domain.as_ref())
            .map(|domain| domain.url.as_str());
        let ctx = MenuContext::new(primary.into_iter().chain([store_domain]), locale_prefix);

        Self {
            shop_name,
            header_menu: payload
                .header_menu
                .map(|raw| Menu::parse(raw, &ctx))
                .unwrap_or_default(),
            footer_menu: payload
                .footer_menu
                .map(|raw| Menu::parse(raw, &ctx))
                .unwrap_or_default(),
        }
    }
}

/// Fetch the layout for `locale`.
///
/// A failed query degrades to [`LayoutData::fallback`] so the shell always
/// renders.
#[instrument(skip(client, locale), fields(locale = %locale))]
pub async fn load_layout<Q: StorefrontQuery>(
    client: &Q,
    locale: &Locale,
    locale_prefix: &str,
    store_domain: &str,
) -> LayoutData {
    let variables = Variables::new()
        .with("headerMenuHandle", HEADER_MENU_HANDLE)
        .with("footerMenuHandle", FOOTER_MENU_HANDLE);

    match client
        .query::<LayoutPayload>(&queries::LAYOUT, variables, locale)
        .await
    {
        Ok(payload) => LayoutData::from_payload(payload, store_domain, locale_prefix),
        Err(e) => {
            tracing::warn!(error = %e, "Layout query failed, rendering fallback shell");
            LayoutData::fallback()
        }
    }
}
