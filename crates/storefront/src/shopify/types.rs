//! Domain types for Shopify Storefront API payloads.
//!
//! Every optional or nested field defaults to "absent" so a sparse payload
//! decodes into the empty case instead of failing.

use anydays_core::RawMenu;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Common Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Format for display, e.g. `$19.00`.
    #[must_use]
    pub fn display(&self) -> String {
        let symbol = match self.currency_code.as_str() {
            "USD" | "CAD" | "AUD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            _ => "",
        };

        match self.amount.parse::<f64>() {
            Ok(amount) if symbol.is_empty() => format!("{amount:.2} {}", self.currency_code),
            Ok(amount) => format!("{symbol}{amount:.2}"),
            Err(_) => format!("{symbol}{}", self.amount),
        }
    }

    /// Whether the amount parses to a positive number.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount.parse::<f64>().is_ok_and(|a| a > 0.0)
    }
}

/// Product, collection, or media image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alt_text: Option<String>,
    /// Image width in pixels.
    #[serde(default)]
    pub width: Option<i64>,
    /// Image height in pixels.
    #[serde(default)]
    pub height: Option<i64>,
}

/// GraphQL connection reduced to its `nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection<T> {
    /// Nodes in the current page.
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

/// Single-value metafield.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metafield {
    /// Metafield value.
    pub value: String,
}

// =============================================================================
// Shop & Layout
// =============================================================================

/// Shop name and description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    /// Shop name.
    pub name: String,
    /// Shop description.
    #[serde(default)]
    pub description: Option<String>,
}

/// The shop's primary domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    /// Absolute URL of the domain.
    pub url: String,
}

/// Shop fields needed for the page shell.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutShop {
    /// Shop name.
    pub name: String,
    /// Primary storefront domain.
    #[serde(default)]
    pub primary_domain: Option<Domain>,
}

/// `LAYOUT_QUERY` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPayload {
    /// Shop data; absent when the API omits it.
    #[serde(default)]
    pub shop: Option<LayoutShop>,
    /// Header navigation menu.
    #[serde(default)]
    pub header_menu: Option<RawMenu>,
    /// Footer navigation menu.
    #[serde(default)]
    pub footer_menu: Option<RawMenu>,
}

// =============================================================================
// Collection Heroes
// =============================================================================

/// Video source for video media.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSource {
    /// Source URL.
    pub url: String,
    /// MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Media referenced by a hero metafield.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaReference {
    /// `IMAGE`, `VIDEO`, `EXTERNAL_VIDEO`, or `MODEL_3D`.
    #[serde(default)]
    pub media_content_type: Option<String>,
    /// Alt text.
    #[serde(default)]
    pub alt: Option<String>,
    /// Preview image (all media types).
    #[serde(default)]
    pub preview_image: Option<Image>,
    /// Full image (images only).
    #[serde(default)]
    pub image: Option<Image>,
    /// Video sources (videos only).
    #[serde(default)]
    pub sources: Vec<VideoSource>,
}

/// Metafield holding a media reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaField {
    /// Referenced media.
    #[serde(default)]
    pub reference: Option<MediaReference>,
}

/// Collection rendered as a hero banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionHero {
    /// Collection ID.
    pub id: String,
    /// Collection handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Collection description as HTML.
    #[serde(default)]
    pub description_html: Option<String>,
    /// `hero.title` metafield.
    #[serde(default)]
    pub heading: Option<Metafield>,
    /// `hero.byline` metafield.
    #[serde(default)]
    pub byline: Option<Metafield>,
    /// `hero.cta` metafield.
    #[serde(default)]
    pub cta: Option<Metafield>,
    /// `hero.spread` metafield.
    #[serde(default)]
    pub spread: Option<MediaField>,
    /// `hero.spread_secondary` metafield.
    #[serde(default)]
    pub spread_secondary: Option<MediaField>,
}

/// `HOMEPAGE_SEO_QUERY` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeSeoPayload {
    /// Shop name and description.
    pub shop: Shop,
    /// Primary hero collection.
    #[serde(default)]
    pub hero: Option<CollectionHero>,
}

/// `COLLECTION_HERO_QUERY` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HeroPayload {
    /// Hero collection.
    #[serde(default)]
    pub hero: Option<CollectionHero>,
}

// =============================================================================
// Product Cards & Collections
// =============================================================================

/// Variant fields shown on a product card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCardVariant {
    /// Variant ID (pass to cart).
    pub id: String,
    /// Whether the variant can be purchased.
    #[serde(default)]
    pub available_for_sale: bool,
    /// Variant image.
    #[serde(default)]
    pub image: Option<Image>,
    /// Variant price.
    pub price: Money,
    /// Compare-at price when discounted.
    #[serde(default)]
    pub compare_at_price: Option<Money>,
}

/// Product summary for cards and swimlanes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    /// Product ID.
    pub id: String,
    /// Product title.
    pub title: String,
    /// Product handle.
    pub handle: String,
    /// Publication time, used for the "New" label.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// First variant.
    #[serde(default)]
    pub variants: Connection<ProductCardVariant>,
}

/// `HOMEPAGE_FEATURED_PRODUCTS_QUERY` and `PRODUCT_SEARCH_QUERY` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsPayload {
    /// Product connection.
    #[serde(default)]
    pub products: Option<Connection<ProductCard>>,
}

/// Collection summary for the featured collections grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturedCollection {
    /// Collection ID.
    pub id: String,
    /// Collection title.
    pub title: String,
    /// Collection handle.
    pub handle: String,
    /// Collection image.
    #[serde(default)]
    pub image: Option<Image>,
}

/// `FEATURED_COLLECTIONS_QUERY` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionsPayload {
    /// Collection connection.
    #[serde(default)]
    pub collections: Option<Connection<FeaturedCollection>>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Product fields on cart merchandise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartProduct {
    /// Product handle.
    pub handle: String,
    /// Product title.
    pub title: String,
}

/// The variant a cart line refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: String,
    /// Variant title ("Default Title" for single-variant products).
    pub title: String,
    /// Variant image.
    #[serde(default)]
    pub image: Option<Image>,
    /// Parent product.
    pub product: CartProduct,
}

/// Cost breakdown for a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCost {
    /// Line total.
    pub total_amount: Money,
    /// Unit price.
    pub amount_per_quantity: Money,
}

/// A line in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: String,
    /// Quantity.
    pub quantity: i64,
    /// Line costs.
    pub cost: CartLineCost,
    /// Purchased variant.
    pub merchandise: CartMerchandise,
}

/// Cart-level costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    /// Subtotal before taxes and shipping.
    pub subtotal_amount: Money,
}

/// A Shopify cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Cart ID (stored in the session).
    pub id: String,
    /// Shopify checkout URL.
    #[serde(default)]
    pub checkout_url: Option<String>,
    /// Total item quantity.
    #[serde(default)]
    pub total_quantity: Option<i64>,
    /// Cart-level costs.
    #[serde(default)]
    pub cost: Option<CartCost>,
    /// Cart lines.
    #[serde(default)]
    pub lines: Connection<CartLine>,
}

impl Cart {
    /// Item count for the badge; missing or negative counts read as zero.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.total_quantity
            .and_then(|q| u32::try_from(q).ok())
            .unwrap_or(0)
    }
}

/// `CART_QUERY` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CartPayload {
    /// The cart, absent when the ID is unknown or expired.
    #[serde(default)]
    pub cart: Option<Cart>,
}

/// User error returned from cart mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error message.
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}

/// Result of a cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationResult {
    /// The updated cart.
    #[serde(default)]
    pub cart: Option<Cart>,
    /// Validation errors.
    #[serde(default)]
    pub user_errors: Vec<CartUserError>,
}

/// `CART_CREATE_MUTATION` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreatePayload {
    /// Mutation result.
    pub cart_create: Option<CartMutationResult>,
}

/// `CART_LINES_ADD_MUTATION` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesAddPayload {
    /// Mutation result.
    pub cart_lines_add: Option<CartMutationResult>,
}

/// Input for adding a line to a cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Variant ID.
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn money(amount: &str, currency: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: currency.to_string(),
        }
    }

    #[test]
    fn test_money_display() {
        assert_eq!(money("19.0", "USD").display(), "$19.00");
        assert_eq!(money("5", "GBP").display(), "£5.00");
        assert_eq!(money("7.5", "SEK").display(), "7.50 SEK");
        assert_eq!(money("n/a", "USD").display(), "$n/a");
    }

    #[test]
    fn test_money_is_positive() {
        assert!(money("1.00", "USD").is_positive());
        assert!(!money("0.0", "USD").is_positive());
    }

    #[test]
    fn test_cart_missing_total_quantity_is_zero() {
        let cart: Cart = serde_json::from_str(r#"{"id": "gid://shopify/Cart/1"}"#).unwrap();
        assert_eq!(cart.item_count(), 0);
        assert!(cart.lines.nodes.is_empty());
    }

    #[test]
    fn test_cart_total_quantity() {
        let cart: Cart =
            serde_json::from_str(r#"{"id": "c", "totalQuantity": 3, "lines": {"nodes": []}}"#)
                .unwrap();
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_home_seo_payload_with_null_hero() {
        let payload: HomeSeoPayload =
            serde_json::from_str(r#"{"shop": {"name": "Acme"}, "hero": null}"#).unwrap();
        assert_eq!(payload.shop.name, "Acme");
        assert!(payload.hero.is_none());
    }

    #[test]
    fn test_product_card_published_at() {
        let card: ProductCard = serde_json::from_str(
            r#"{
                "id": "p1", "title": "Boxer", "handle": "boxer",
                "publishedAt": "2026-10-01T00:00:00Z",
                "variants": {"nodes": [{"id": "v1", "availableForSale": true,
                    "price": {"amount": "30.0", "currencyCode": "USD"}}]}
            }"#,
        )
        .unwrap();
        assert!(card.published_at.is_some());
        assert_eq!(card.variants.nodes[0].price.display(), "$30.00");
    }
}
