//! GraphQL documents for the Shopify Storefront API.
//!
//! Documents live in `graphql/storefront/` and are assembled at compile time
//! with the fragments they spread.

/// Whether a query's payload may be served from the client cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always hit the API (carts, mutations, search).
    NoStore,
    /// Cache for the configured query TTL.
    Short,
}

/// A GraphQL document sent to the Storefront API.
#[derive(Debug)]
pub struct QueryDocument {
    /// GraphQL operation name (also the cache key namespace).
    pub operation_name: &'static str,
    /// Full document text including fragments.
    pub source: &'static str,
    /// Cache policy for the payload.
    pub cache: CachePolicy,
}

impl QueryDocument {
    /// Whether the document declares `@inContext` and so takes
    /// `$country`/`$language` variables.
    #[must_use]
    pub fn is_localized(&self) -> bool {
        self.source.contains("@inContext")
    }

    /// Whether the document declares `$name` as a variable.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.source.contains(&format!("${name}:"))
    }
}

macro_rules! document {
    ($query:literal $(, $fragment:literal)* $(,)?) => {
        concat!(
            include_str!(concat!("../../../graphql/storefront/queries/", $query, ".graphql")),
            $("\n", include_str!(concat!("../../../graphql/storefront/fragments/", $fragment, ".graphql")),)*
        )
    };
}

/// Shop name, primary domain, and the header and footer menus.
pub const LAYOUT: QueryDocument = QueryDocument {
    operation_name: "layout",
    source: document!("layout", "menu"),
    cache: CachePolicy::Short,
};

/// Shop SEO fields plus a hero collection. Gates the home page.
pub const HOMEPAGE_SEO: QueryDocument = QueryDocument {
    operation_name: "homepageSeo",
    source: document!("homepage_seo", "collection_content", "media"),
    cache: CachePolicy::Short,
};

/// A single hero collection by handle.
pub const COLLECTION_HERO: QueryDocument = QueryDocument {
    operation_name: "collectionHero",
    source: document!("collection_hero", "collection_content", "media"),
    cache: CachePolicy::Short,
};

/// First three products for the home swimlane.
pub const FEATURED_PRODUCTS: QueryDocument = QueryDocument {
    operation_name: "homepageFeaturedProducts",
    source: document!("featured_products", "product_card"),
    cache: CachePolicy::Short,
};

/// Four most recently updated collections.
pub const FEATURED_COLLECTIONS: QueryDocument = QueryDocument {
    operation_name: "homepageFeaturedCollections",
    source: document!("featured_collections"),
    cache: CachePolicy::Short,
};

/// Product search by free-text term.
pub const PRODUCT_SEARCH: QueryDocument = QueryDocument {
    operation_name: "productSearch",
    source: document!("product_search", "product_card"),
    cache: CachePolicy::NoStore,
};

pub const CART: QueryDocument = QueryDocument {
    operation_name: "cart",
    source: document!("cart", "cart"),
    cache: CachePolicy::NoStore,
};

pub const CART_CREATE: QueryDocument = QueryDocument {
    operation_name: "cartCreate",
    source: document!("cart_create", "cart"),
    cache: CachePolicy::NoStore,
};

pub const CART_LINES_ADD: QueryDocument = QueryDocument {
    operation_name: "cartLinesAdd",
    source: document!("cart_lines_add", "cart"),
    cache: CachePolicy::NoStore,
};
