//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. Inline scripts are
//! allowed only with the per-request nonce from [`CspNonce`], which the
//! streamed slot swaps depend on.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Pinned client runtime loaded by `layout.html`.
pub const HTMX_SRC: &str = "https://unpkg.com/htmx.org@1.9.12";

/// Build the Content-Security-Policy for a request nonce.
///
/// ```text
/// default-src 'none';
/// script-src 'self' https://unpkg.com/htmx.org@1.9.12 'nonce-…';
/// style-src 'self';
/// font-src 'self';
/// img-src 'self' https://cdn.shopify.com;
/// media-src 'self' https://cdn.shopify.com;
/// connect-src 'self';
/// frame-src 'none';
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self' https://*.myshopify.com;
/// frame-ancestors 'none';
/// upgrade-insecure-requests
/// ```
#[must_use]
pub fn content_security_policy(nonce: &str) -> String {
    let script_src = if nonce.is_empty() {
        format!("'self' {HTMX_SRC}")
    } else {
        format!("'self' {HTMX_SRC} 'nonce-{nonce}'")
    };

    format!(
        "default-src 'none'; \
         script-src {script_src}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' https://cdn.shopify.com; \
         media-src 'self' https://cdn.shopify.com; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self' https://*.myshopify.com; \
         frame-ancestors 'none'; \
         upgrade-insecure-requests"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: same-origin` (the menu follow endpoint falls back to it)
/// - `Content-Security-Policy` with the request nonce
/// - `Permissions-Policy` denying sensitive features
/// - `Cache-Control: no-store, max-age=0` unless the handler set its own
/// - `Cross-Origin-Opener-Policy: same-origin`
/// - `Cross-Origin-Resource-Policy: same-origin`
/// - `Cross-Origin-Embedder-Policy: credentialless` (Shopify CDN media)
/// - `X-DNS-Prefetch-Control: off`
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_owned())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));

    match HeaderValue::from_str(&content_security_policy(&nonce)) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::error!(error = %e, "Invalid CSP header value"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             autoplay=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             hid=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    // Pages set their own caching; everything else is private
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, middleware, response::IntoResponse, routing::get};
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::csp_nonce_middleware;

    #[test]
    fn test_policy_includes_nonce() {
        let policy = content_security_policy("abc123");
        assert!(policy.contains(
            "script-src 'self' https://unpkg.com/htmx.org@1.9.12 'nonce-abc123';"
        ));
        assert!(policy.contains("img-src 'self' https://cdn.shopify.com;"));
    }

    #[test]
    fn test_policy_without_nonce() {
        assert!(
            content_security_policy("").contains("script-src 'self' https://unpkg.com/htmx.org@1.9.12;")
        );
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route(
                "/cached",
                get(|| async { ([(CACHE_CONTROL, "public, max-age=1")], "ok").into_response() }),
            )
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(middleware::from_fn(csp_nonce_middleware))
    }

    #[tokio::test]
    async fn test_default_cache_control_is_no_store() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store, max-age=0");
        let csp = response.headers()[CONTENT_SECURITY_POLICY].to_str().unwrap();
        assert!(csp.contains("'nonce-"));
    }

    #[tokio::test]
    async fn test_handler_cache_control_is_kept() {
        let response = app()
            .oneshot(Request::builder().uri("/cached").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=1");
    }
}
