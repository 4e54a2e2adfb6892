//! Navigation menus.
//!
//! Menus arrive from the Storefront API as absolute URLs tagged with a
//! resource type. [`Menu::parse`] turns them into storefront paths: links to
//! the shop's own domains become locale-prefixed relative paths, anything else
//! stays an external link that opens in a new tab.

use serde::{Deserialize, Serialize};
use url::Url;

/// Menu as returned by the Storefront API `menu(handle:)` field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMenu {
    /// Shopify menu ID.
    pub id: String,
    /// Top-level items.
    #[serde(default)]
    pub items: Vec<RawMenuItem>,
}

/// Menu item as returned by the Storefront API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMenuItem {
    /// Shopify menu item ID.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Absolute URL of the linked resource.
    pub url: Option<String>,
    /// Resource type (`COLLECTION`, `PRODUCT`, `HTTP`, ...).
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Nested items.
    #[serde(default)]
    pub items: Vec<Self>,
}

/// Where a link opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum LinkTarget {
    /// Same browsing context.
    #[default]
    #[serde(rename = "_self")]
    SelfFrame,
    /// New tab.
    #[serde(rename = "_blank")]
    Blank,
}

impl LinkTarget {
    /// HTML `target` attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelfFrame => "_self",
            Self::Blank => "_blank",
        }
    }
}

/// A parsed navigation menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Menu {
    /// Shopify menu ID.
    pub id: String,
    /// Top-level items, in display order.
    pub items: Vec<MenuItem>,
}

/// A parsed menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Stable key (Shopify menu item ID).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Link destination: a storefront path for internal links, the original
    /// URL for external ones.
    pub to: String,
    /// Link target.
    pub target: LinkTarget,
    /// Whether the link leaves the storefront.
    pub is_external: bool,
    /// Nested items.
    pub items: Vec<Self>,
}

impl MenuItem {
    /// Whether the item has nested items.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.items.is_empty()
    }
}

/// Inputs for resolving menu URLs into storefront paths.
#[derive(Debug, Clone, Default)]
pub struct MenuContext {
    /// Hosts that count as "this storefront" (primary domain, myshopify domain).
    pub internal_hosts: Vec<String>,
    /// Locale path prefix prepended to internal links (`""` or `/fr-ca`).
    pub locale_prefix: String,
}

impl MenuContext {
    /// Build a context from the shop's domains.
    ///
    /// Unparseable URLs are ignored; bare host names are accepted as-is.
    #[must_use]
    pub fn new<'a>(domains: impl IntoIterator<Item = &'a str>, locale_prefix: &str) -> Self {
        let internal_hosts = domains
            .into_iter()
            .filter_map(|d| {
                Url::parse(d)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_owned))
                    .or_else(|| (!d.contains('/') && !d.is_empty()).then(|| d.to_owned()))
            })
            .collect();

        Self {
            internal_hosts,
            locale_prefix: locale_prefix.to_owned(),
        }
    }

    fn is_internal(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.internal_hosts.iter().any(|h| h == host))
    }
}

impl Menu {
    /// Parse a raw API menu.
    ///
    /// Items without a URL or type are dropped.
    #[must_use]
    pub fn parse(raw: RawMenu, ctx: &MenuContext) -> Self {
        Self {
            id: raw.id,
            items: parse_items(raw.items, ctx),
        }
    }

    /// Whether the menu has no top-level items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn parse_items(items: Vec<RawMenuItem>, ctx: &MenuContext) -> Vec<MenuItem> {
    items
        .into_iter()
        .filter_map(|item| parse_item(item, ctx))
        .collect()
}

fn parse_item(item: RawMenuItem, ctx: &MenuContext) -> Option<MenuItem> {
    let (Some(raw_url), Some(kind)) = (item.url.as_deref(), item.kind.as_deref()) else {
        tracing::warn!(id = %item.id, "Invalid menu item, must include a url and type");
        return None;
    };

    let Ok(url) = Url::parse(raw_url) else {
        tracing::warn!(id = %item.id, url = %raw_url, "Menu item url is not absolute");
        return None;
    };

    let (to, target, is_external) = if ctx.is_internal(&url) {
        let path = resolve_path(kind, url.path());
        let to = if path == "/" && !ctx.locale_prefix.is_empty() {
            ctx.locale_prefix.clone()
        } else {
            format!("{}{path}", ctx.locale_prefix)
        };
        (to, LinkTarget::SelfFrame, false)
    } else {
        (raw_url.to_owned(), LinkTarget::Blank, true)
    };

    Some(MenuItem {
        id: item.id,
        title: item.title,
        to,
        target,
        is_external,
        items: parse_items(item.items, ctx),
    })
}

/// Map a resource type and URL path to a storefront path.
fn resolve_path(kind: &str, pathname: &str) -> String {
    let mut parts: Vec<&str> = pathname.split('/').filter(|p| !p.is_empty()).collect();
    let handle = parts.pop().unwrap_or_default();

    match kind {
        "FRONTPAGE" => "/".to_owned(),
        "ARTICLE" => {
            let blog = parts.pop().unwrap_or_default();
            format!("/blogs/{blog}/{handle}/")
        }
        "COLLECTIONS" => "/collections".to_owned(),
        "SEARCH" => "/search".to_owned(),
        "CATALOG" => "/collections/all".to_owned(),
        other => match route_prefix(other) {
            Some(prefix) => format!("/{prefix}/{handle}"),
            None => format!("/{handle}"),
        },
    }
}

fn route_prefix(kind: &str) -> Option<&'static str> {
    match kind {
        "BLOG" => Some("blogs"),
        "COLLECTION" => Some("collections"),
        "PAGE" => Some("pages"),
        "PRODUCT" => Some("products"),
        "SHOP_POLICY" => Some("policies"),
        _ => None,
    }
}
