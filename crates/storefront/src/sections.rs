//! Page sections fed by Storefront API data: collection heroes, the product
//! swimlane and the featured collections grid.
//!
//! Each `render_*` function returns `None` when its payload is empty, which
//! suppresses the section entirely.

use askama::Template;
use chrono::{DateTime, Duration, Utc};

use crate::shell::overlay::render_logged;
use crate::shopify::types::{
    CollectionHero, CollectionsPayload, FeaturedCollection, HeroPayload, MediaField, Money,
    ProductCard, ProductsPayload,
};

/// Products published within this window get the "New" label.
const NEW_ARRIVAL_DAYS: i64 = 30;

// =============================================================================
// Hero
// =============================================================================

/// Media shown in a hero spread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaView {
    pub url: String,
    pub alt: String,
    pub is_video: bool,
    pub poster: Option<String>,
}

impl MediaView {
    fn from_field(field: Option<&MediaField>, fallback_alt: &str) -> Option<Self> {
        let media = field?.reference.as_ref()?;
        let alt = media
            .alt
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| fallback_alt.to_owned());

        if media.media_content_type.as_deref() == Some("VIDEO") {
            let source = media.sources.first()?;
            return Some(Self {
                url: source.url.clone(),
                alt,
                is_video: true,
                poster: media.preview_image.as_ref().map(|i| i.url.clone()),
            });
        }

        let image = media.image.as_ref().or(media.preview_image.as_ref())?;
        Some(Self {
            url: image.url.clone(),
            alt: image.alt_text.clone().unwrap_or(alt),
            is_video: false,
            poster: None,
        })
    }
}

/// How prominently a hero renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeroPlacement {
    /// Full-height, at the top of the page, media loaded eagerly.
    Primary,
    /// Further down the page.
    Secondary,
}

/// Collection hero display data.
#[derive(Debug, Clone)]
pub struct HeroView {
    pub heading: String,
    pub byline: Option<String>,
    pub cta: Option<String>,
    pub href: String,
    pub spread: Option<MediaView>,
    pub spread_secondary: Option<MediaView>,
    pub full: bool,
    pub eager: bool,
}

impl HeroView {
    #[must_use]
    pub fn new(hero: &CollectionHero, placement: HeroPlacement, locale_prefix: &str) -> Self {
        let heading = hero
            .heading
            .as_ref()
            .map_or_else(|| hero.title.clone(), |m| m.value.clone());
        let primary = placement == HeroPlacement::Primary;

        Self {
            spread: MediaView::from_field(hero.spread.as_ref(), &heading),
            spread_secondary: MediaView::from_field(hero.spread_secondary.as_ref(), &heading),
            byline: hero.byline.as_ref().map(|m| m.value.clone()),
            cta: hero.cta.as_ref().map(|m| m.value.clone()),
            href: format!("{locale_prefix}/collections/{}", hero.handle),
            heading,
            full: primary,
            eager: primary,
        }
    }
}

#[derive(Template)]
#[template(path = "partials/hero.html")]
pub struct HeroTemplate {
    pub hero: HeroView,
}

/// Placeholder shown while a deferred hero resolves.
#[derive(Template)]
#[template(path = "partials/hero_skeleton.html")]
pub struct HeroSkeletonTemplate;

/// Render a hero, or nothing for an absent collection.
#[must_use]
pub fn render_hero(
    hero: Option<&CollectionHero>,
    placement: HeroPlacement,
    locale_prefix: &str,
) -> Option<String> {
    let hero = HeroView::new(hero?, placement, locale_prefix);
    render_logged(&HeroTemplate { hero })
}

/// Render a deferred hero payload.
#[must_use]
pub fn render_hero_payload(payload: Option<&HeroPayload>, locale_prefix: &str) -> Option<String> {
    render_hero(
        payload.and_then(|p| p.hero.as_ref()),
        HeroPlacement::Secondary,
        locale_prefix,
    )
}

/// Skeleton markup for a pending hero.
#[must_use]
pub fn hero_skeleton() -> Option<String> {
    render_logged(&HeroSkeletonTemplate)
}

// =============================================================================
// Products
// =============================================================================

/// Product card display data.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub title: String,
    pub href: String,
    pub image_url: Option<String>,
    pub image_alt: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub label: Option<&'static str>,
}

impl ProductCardView {
    /// Card for a product; `None` when it has no variant to show.
    #[must_use]
    pub fn new(product: &ProductCard, locale_prefix: &str, now: DateTime<Utc>) -> Option<Self> {
        let variant = product.variants.nodes.first()?;
        let discounted = variant
            .compare_at_price
            .as_ref()
            .filter(|c| c.is_positive() && c.currency_code == variant.price.currency_code)
            .filter(|c| {
                match (c.amount.parse::<f64>(), variant.price.amount.parse::<f64>()) {
                    (Ok(compare), Ok(price)) => compare > price,
                    _ => false,
                }
            });
        let is_new = product
            .published_at
            .is_some_and(|published| now - published < Duration::days(NEW_ARRIVAL_DAYS));

        let label = if discounted.is_some() {
            Some("Sale")
        } else if is_new {
            Some("New")
        } else {
            None
        };

        Some(Self {
            title: product.title.clone(),
            href: format!("{locale_prefix}/products/{}", product.handle),
            image_url: variant.image.as_ref().map(|i| i.url.clone()),
            image_alt: variant
                .image
                .as_ref()
                .and_then(|i| i.alt_text.clone())
                .unwrap_or_else(|| product.title.clone()),
            price: variant.price.display(),
            compare_at_price: discounted.map(Money::display),
            label,
        })
    }
}

/// Horizontal product swimlane.
#[derive(Template)]
#[template(path = "partials/product_swimlane.html")]
pub struct ProductSwimlaneTemplate {
    pub title: String,
    pub products: Vec<ProductCardView>,
}

/// Cards for up to `count` products.
#[must_use]
pub fn product_cards(products: &[ProductCard], count: usize, locale_prefix: &str) -> Vec<ProductCardView> {
    let now = Utc::now();
    products
        .iter()
        .filter_map(|p| ProductCardView::new(p, locale_prefix, now))
        .take(count)
        .collect()
}

/// Render the featured products swimlane, or nothing when there are none.
#[must_use]
pub fn render_swimlane(
    payload: Option<&ProductsPayload>,
    title: &str,
    locale_prefix: &str,
) -> Option<String> {
    let products = product_cards(&payload?.products.as_ref()?.nodes, 4, locale_prefix);
    if products.is_empty() {
        return None;
    }

    render_logged(&ProductSwimlaneTemplate {
        title: title.to_owned(),
        products,
    })
}

// =============================================================================
// Collections
// =============================================================================

/// Featured collection display data.
#[derive(Debug, Clone)]
pub struct CollectionCardView {
    pub title: String,
    pub href: String,
    pub image_url: String,
    pub image_alt: String,
}

impl CollectionCardView {
    /// Card for a collection; collections without an image are skipped.
    #[must_use]
    pub fn new(collection: &FeaturedCollection, locale_prefix: &str) -> Option<Self> {
        let image = collection.image.as_ref()?;
        Some(Self {
            title: collection.title.clone(),
            href: format!("{locale_prefix}/collections/{}", collection.handle),
            image_url: image.url.clone(),
            image_alt: image
                .alt_text
                .clone()
                .unwrap_or_else(|| collection.title.clone()),
        })
    }
}

#[derive(Template)]
#[template(path = "partials/featured_collections.html")]
pub struct FeaturedCollectionsTemplate {
    pub title: String,
    pub collections: Vec<CollectionCardView>,
}

/// Render the featured collections grid, or nothing when none has an image.
#[must_use]
pub fn render_collections(
    payload: Option<&CollectionsPayload>,
    title: &str,
    locale_prefix: &str,
) -> Option<String> {
    let collections: Vec<_> = payload?
        .collections
        .as_ref()?
        .nodes
        .iter()
        .filter_map(|c| CollectionCardView::new(c, locale_prefix))
        .collect();
    if collections.is_empty() {
        return None;
    }

    render_logged(&FeaturedCollectionsTemplate {
        title: title.to_owned(),
        collections,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn hero(value: serde_json::Value) -> CollectionHero {
        serde_json::from_value(value).unwrap()
    }

    fn product(value: serde_json::Value) -> ProductCard {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_hero_heading_prefers_metafield() {
        let with_heading = hero(json!({
            "id": "c1", "handle": "freestyle", "title": "Freestyle",
            "heading": {"value": "Move freely"},
            "byline": {"value": "New season"}
        }));
        let view = HeroView::new(&with_heading, HeroPlacement::Primary, "/fr-ca");
        assert_eq!(view.heading, "Move freely");
        assert_eq!(view.href, "/fr-ca/collections/freestyle");
        assert!(view.full);

        let plain = hero(json!({"id": "c2", "handle": "winter-2022", "title": "Winter"}));
        let view = HeroView::new(&plain, HeroPlacement::Secondary, "");
        assert_eq!(view.heading, "Winter");
        assert!(!view.eager);
        assert!(view.spread.is_none());
    }

    #[test]
    fn test_hero_media_variants() {
        let view = HeroView::new(
            &hero(json!({
                "id": "c1", "handle": "h", "title": "T",
                "spread": {"reference": {
                    "mediaContentType": "VIDEO",
                    "previewImage": {"url": "https://cdn.shopify.com/poster.jpg"},
                    "sources": [{"url": "https://cdn.shopify.com/clip.mp4", "mimeType": "video/mp4"}]
                }},
                "spreadSecondary": {"reference": {
                    "mediaContentType": "IMAGE",
                    "image": {"url": "https://cdn.shopify.com/a.jpg", "altText": "A"}
                }}
            })),
            HeroPlacement::Secondary,
            "",
        );

        let spread = view.spread.unwrap();
        assert!(spread.is_video);
        assert_eq!(spread.poster.as_deref(), Some("https://cdn.shopify.com/poster.jpg"));
        let secondary = view.spread_secondary.unwrap();
        assert!(!secondary.is_video);
        assert_eq!(secondary.alt, "A");
    }

    #[test]
    fn test_absent_hero_renders_nothing() {
        assert!(render_hero(None, HeroPlacement::Primary, "").is_none());
        assert!(render_hero_payload(Some(&HeroPayload { hero: None }), "").is_none());
        assert!(render_hero_payload(None, "").is_none());
    }

    #[test]
    fn test_product_labels() {
        let now = Utc::now();
        let sale = product(json!({
            "id": "p1", "title": "Boxer", "handle": "boxer",
            "variants": {"nodes": [{
                "id": "v1",
                "price": {"amount": "20.0", "currencyCode": "USD"},
                "compareAtPrice": {"amount": "30.0", "currencyCode": "USD"}
            }]}
        }));
        let view = ProductCardView::new(&sale, "", now).unwrap();
        assert_eq!(view.label, Some("Sale"));
        assert_eq!(view.compare_at_price.as_deref(), Some("$30.00"));

        let fresh = product(json!({
            "id": "p2", "title": "Brief", "handle": "brief",
            "publishedAt": (now - Duration::days(2)).to_rfc3339(),
            "variants": {"nodes": [{"id": "v2", "price": {"amount": "20.0", "currencyCode": "USD"}}]}
        }));
        assert_eq!(ProductCardView::new(&fresh, "", now).unwrap().label, Some("New"));
    }

    #[test]
    fn test_product_without_variant_is_skipped() {
        let bare = product(json!({"id": "p1", "title": "Boxer", "handle": "boxer"}));
        assert!(ProductCardView::new(&bare, "", Utc::now()).is_none());
    }

    #[test]
    fn test_empty_payloads_suppress_sections() {
        let products = ProductsPayload {
            products: Some(Default::default()),
        };
        assert!(render_swimlane(Some(&products), "", "").is_none());
        assert!(render_swimlane(Some(&ProductsPayload { products: None }), "", "").is_none());

        let collections: CollectionsPayload = serde_json::from_value(json!({
            "collections": {"nodes": [{"id": "c1", "title": "No image", "handle": "x"}]}
        }))
        .unwrap();
        assert!(render_collections(Some(&collections), "Collections", "").is_none());
    }

    #[test]
    fn test_collections_render_with_images() {
        let collections: CollectionsPayload = serde_json::from_value(json!({
            "collections": {"nodes": [
                {"id": "c1", "title": "Boxers", "handle": "boxers",
                 "image": {"url": "https://cdn.shopify.com/b.jpg"}}
            ]}
        }))
        .unwrap();
        let html = render_collections(Some(&collections), "Collections", "").unwrap();
        assert!(html.contains("Collections"));
        assert!(html.contains(r#"href="/collections/boxers""#));
    }
}
