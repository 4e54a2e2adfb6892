//! Storefront locale (language + country) and per-request negotiation.
//!
//! A locale is written in URLs as a lowercase `{language}-{country}` path
//! segment, e.g. `/fr-ca/search`. The default locale has no path segment.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Locale`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocaleError {
    /// The input string is empty.
    #[error("locale cannot be empty")]
    Empty,
    /// The input has no `-` separating language and country.
    #[error("locale must be written as language-country (got {0:?})")]
    MissingSeparator(String),
    /// The language part is not a Shopify language code.
    #[error("invalid language code {0:?}")]
    InvalidLanguage(String),
    /// The country part is not an ISO 3166-1 alpha-2 code.
    #[error("invalid country code {0:?}")]
    InvalidCountry(String),
}

/// A (language, country) pair negotiated per request.
///
/// Codes are stored upper-case as the Storefront API expects them
/// (`LanguageCode`, `CountryCode`).
///
/// ## Examples
///
/// ```
/// use anydays_core::Locale;
///
/// let locale = Locale::parse("fr-ca").unwrap();
/// assert_eq!(locale.language(), "FR");
/// assert_eq!(locale.country(), "CA");
/// assert_eq!(locale.tag(), "fr-ca");
///
/// assert!(Locale::parse("").is_err());
/// assert!(Locale::parse("english").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    country: String,
}

impl Locale {
    /// Parse a locale from a `language-country` tag (case-insensitive).
    ///
    /// Language codes may contain an underscore region (`pt_br-br`).
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is empty, has no separator, or either
    /// code is malformed.
    pub fn parse(s: &str) -> Result<Self, LocaleError> {
        if s.is_empty() {
            return Err(LocaleError::Empty);
        }

        let (language, country) = s
            .rsplit_once('-')
            .ok_or_else(|| LocaleError::MissingSeparator(s.to_owned()))?;

        Self::new(language, country)
    }

    /// Build a locale from separate language and country codes.
    ///
    /// # Errors
    ///
    /// Returns an error if either code is malformed.
    pub fn new(language: &str, country: &str) -> Result<Self, LocaleError> {
        let language_ok = (2..=5).contains(&language.len())
            && language.starts_with(|c: char| c.is_ascii_alphabetic())
            && language
                .chars()
                .all(|c| c.is_ascii_alphabetic() || c == '_');
        if !language_ok {
            return Err(LocaleError::InvalidLanguage(language.to_owned()));
        }

        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LocaleError::InvalidCountry(country.to_owned()));
        }

        Ok(Self {
            language: language.to_ascii_uppercase(),
            country: country.to_ascii_uppercase(),
        })
    }

    /// Storefront API `LanguageCode` (e.g. `EN`).
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Storefront API `CountryCode` (e.g. `US`).
    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Lowercase URL tag, e.g. `en-us`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}-{}", self.language, self.country).to_ascii_lowercase()
    }

    /// BCP 47 style tag for the `<html lang>` attribute, e.g. `en-US`.
    #[must_use]
    pub fn html_lang(&self) -> String {
        format!(
            "{}-{}",
            self.language.replace('_', "-").to_ascii_lowercase(),
            self.country
        )
    }

    /// Whether a route `lang` parameter names this locale.
    #[must_use]
    pub fn matches_param(&self, param: &str) -> bool {
        param.to_ascii_lowercase() == self.tag()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl std::str::FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Locale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag())
    }
}

impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::parse(&tag).map_err(serde::de::Error::custom)
    }
}

/// Chooses the locale for a request from its first path segment.
///
/// A segment that parses to a supported locale selects it; anything else
/// (no segment, an unsupported locale, an ordinary path like `cart`) falls
/// back to the default locale.
#[derive(Debug, Clone)]
pub struct LocaleNegotiator {
    default: Locale,
    supported: Vec<Locale>,
}

impl LocaleNegotiator {
    /// Create a negotiator. The default locale is always supported.
    #[must_use]
    pub fn new(default: Locale, supported: impl IntoIterator<Item = Locale>) -> Self {
        let mut all = vec![default.clone()];
        for locale in supported {
            if !all.contains(&locale) {
                all.push(locale);
            }
        }

        Self {
            default,
            supported: all,
        }
    }

    /// The fallback locale.
    #[must_use]
    pub const fn default_locale(&self) -> &Locale {
        &self.default
    }

    /// All supported locales, default first.
    #[must_use]
    pub fn supported(&self) -> &[Locale] {
        &self.supported
    }

    /// Negotiate from a request path such as `/fr-ca/search`.
    #[must_use]
    pub fn negotiate_path(&self, path: &str) -> Locale {
        self.negotiate(path.trim_start_matches('/').split('/').next())
    }

    /// Negotiate from an optional first path segment.
    #[must_use]
    pub fn negotiate(&self, segment: Option<&str>) -> Locale {
        segment
            .filter(|s| !s.is_empty())
            .and_then(|s| Locale::parse(s).ok())
            .and_then(|candidate| self.supported.iter().find(|l| **l == candidate).cloned())
            .unwrap_or_else(|| self.default.clone())
    }

    /// Path prefix for links in `locale`: empty for the default locale,
    /// `/{tag}` otherwise.
    #[must_use]
    pub fn path_prefix(&self, locale: &Locale) -> String {
        if *locale == self.default {
            String::new()
        } else {
            format!("/{}", locale.tag())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn negotiator() -> LocaleNegotiator {
        LocaleNegotiator::new(
            Locale::parse("en-us").unwrap(),
            [Locale::parse("fr-ca").unwrap(), Locale::parse("en-ca").unwrap()],
        )
    }

    #[test]
    fn test_parse_valid_locales() {
        assert!(Locale::parse("en-us").is_ok());
        assert!(Locale::parse("EN-US").is_ok());
        assert!(Locale::parse("pt_br-br").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Locale::parse(""), Err(LocaleError::Empty));
    }

    #[test]
    fn test_parse_missing_separator() {
        assert!(matches!(
            Locale::parse("enus"),
            Err(LocaleError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_parse_invalid_codes() {
        assert!(matches!(
            Locale::parse("e-us"),
            Err(LocaleError::InvalidLanguage(_))
        ));
        assert!(matches!(
            Locale::parse("en-usa"),
            Err(LocaleError::InvalidCountry(_))
        ));
        assert!(matches!(
            Locale::parse("en-u1"),
            Err(LocaleError::InvalidCountry(_))
        ));
    }

    #[test]
    fn test_codes_are_uppercased() {
        let locale = Locale::parse("fr-ca").unwrap();
        assert_eq!(locale.language(), "FR");
        assert_eq!(locale.country(), "CA");
        assert_eq!(locale.html_lang(), "fr-CA");
    }

    #[test]
    fn test_matches_param_is_case_insensitive() {
        let locale = Locale::parse("en-us").unwrap();
        assert!(locale.matches_param("EN-us"));
        assert!(!locale.matches_param("fr-ca"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let locale = Locale::parse("fr-ca").unwrap();
        let json = serde_json::to_string(&locale).unwrap();
        assert_eq!(json, "\"fr-ca\"");

        let parsed: Locale = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, locale);
    }

    #[test]
    fn test_negotiate_supported_segment() {
        let locale = negotiator().negotiate_path("/fr-ca/search");
        assert_eq!(locale.tag(), "fr-ca");
    }

    #[test]
    fn test_negotiate_unsupported_falls_back() {
        let n = negotiator();
        assert_eq!(n.negotiate_path("/de-de").tag(), "en-us");
        assert_eq!(n.negotiate_path("/cart").tag(), "en-us");
        assert_eq!(n.negotiate_path("/").tag(), "en-us");
        assert_eq!(n.negotiate(None).tag(), "en-us");
    }

    #[test]
    fn test_path_prefix() {
        let n = negotiator();
        assert_eq!(n.path_prefix(&Locale::parse("en-us").unwrap()), "");
        assert_eq!(n.path_prefix(&Locale::parse("fr-ca").unwrap()), "/fr-ca");
    }

    #[test]
    fn test_default_is_always_supported() {
        let n = LocaleNegotiator::new(Locale::parse("en-us").unwrap(), []);
        assert_eq!(n.supported().len(), 1);
    }
}
