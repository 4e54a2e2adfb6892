//! Routing inputs consumed by the shell: the current path and locale.

use anydays_core::Locale;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;

/// Header HTMX sets to the URL of the page that issued the request.
pub const HX_CURRENT_URL_HEADER: &str = "hx-current-url";

/// Active-route predicate built from the page path.
///
/// For HTMX fragment requests the page path comes from `HX-Current-URL`,
/// so a drawer re-rendered by `/shell/menu/open` still marks the page the
/// visitor is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRoute {
    path: String,
}

impl ActiveRoute {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize(path).to_owned(),
        }
    }

    /// The page path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether a link to `to` points at the current page.
    #[must_use]
    pub fn is_active(&self, to: &str) -> bool {
        !to.starts_with("http") && normalize(strip_query(to)) == self.path
    }

    /// Whether the page is the home page for the locale prefix.
    #[must_use]
    pub fn is_home(&self, locale_prefix: &str) -> bool {
        self.path == "/" || (!locale_prefix.is_empty() && self.path == locale_prefix)
    }
}

fn strip_query(to: &str) -> &str {
    to.split(['?', '#']).next().unwrap_or(to)
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

impl<S> FromRequestParts<S> for ActiveRoute
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_htmx = parts
            .headers
            .get(HX_CURRENT_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| url::Url::parse(v).ok())
            .map(|url| url.path().to_owned());

        Ok(Self::new(
            from_htmx.as_deref().unwrap_or_else(|| parts.uri.path()),
        ))
    }
}

/// Locale negotiated for the request from its page path.
#[derive(Debug, Clone)]
pub struct RequestLocale {
    pub locale: Locale,
    /// Path prefix for internal links (`""` for the default locale).
    pub prefix: String,
}

impl FromRequestParts<AppState> for RequestLocale {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ActiveRoute { path } = ActiveRoute::from_request_parts(parts, state).await?;
        let negotiator = state.negotiator();
        let locale = negotiator.negotiate_path(&path);
        let prefix = negotiator.path_prefix(&locale);

        Ok(Self { locale, prefix })
    }
}

/// Reject a route `lang` parameter that does not name the negotiated locale.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] on mismatch.
pub fn ensure_locale_param(param: Option<&str>, negotiated: &Locale) -> Result<(), AppError> {
    match param {
        Some(lang) if !negotiated.matches_param(lang) => {
            tracing::debug!(lang, negotiated = %negotiated, "Locale parameter does not match");
            Err(AppError::NotFound(format!("locale {lang}")))
        }
        _ => Ok(()),
    }
}
