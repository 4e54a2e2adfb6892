//! Anydays Core - Shared types library.
//!
//! This crate provides the types shared by the Anydays components:
//! - `storefront` - Public-facing e-commerce site
//! - `integration-tests` - End-to-end router tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Locale negotiation and navigation menu parsing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
