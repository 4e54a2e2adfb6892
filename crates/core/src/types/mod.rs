//! Core types for Anydays.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod locale;
pub mod menu;

pub use locale::{Locale, LocaleError, LocaleNegotiator};
pub use menu::{LinkTarget, Menu, MenuContext, MenuItem, RawMenu, RawMenuItem};
