//! Streamed page bodies.
//!
//! A page is written as one head chunk (the full shell with placeholders)
//! followed by one replacement chunk per deferred slot, in the order the
//! slots settle, then the closing tags. Each replacement is a `<template>`
//! plus a nonce-bearing call to the `__swapSlot` helper defined in the
//! layout.

use std::convert::Infallible;

use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use futures::stream::{self, FuturesUnordered, StreamExt};
use futures::FutureExt;

use super::deferred::Deferred;

/// Closing tags written after the last replacement chunk.
pub const DOCUMENT_TAIL: &str = "</body></html>";

/// Collects the deferred slots of one page render.
pub struct Slots {
    nonce: String,
    next_id: usize,
    pending: Vec<BoxFuture<'static, String>>,
}

impl std::fmt::Debug for Slots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slots")
            .field("next_id", &self.next_id)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Slots {
    /// Create an empty slot set. `nonce` goes on every swap script.
    #[must_use]
    pub fn new(nonce: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Number of slots still waiting on their data.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Place a deferred section and return the markup for its position.
    ///
    /// A handle that has already settled renders inline. Otherwise the
    /// fallback (or nothing) is wrapped in a slot element and `view` runs
    /// once the handle settles. `view` returning `None` suppresses the
    /// section.
    pub fn place<T, F>(&mut self, deferred: &Deferred<T>, fallback: Option<String>, view: F) -> String
    where
        T: Send + Sync + 'static,
        F: FnOnce(Option<&T>) -> Option<String> + Send + 'static,
    {
        if let Some(settled) = deferred.try_settled() {
            return view(settled.as_deref()).unwrap_or_default();
        }

        let id = format!("slot-{}", self.next_id);
        self.next_id += 1;

        let handle = deferred.clone();
        let nonce = self.nonce.clone();
        let slot_id = id.clone();
        self.pending.push(
            async move {
                let settled = handle.settled().await;
                let html = view(settled.as_deref()).unwrap_or_default();
                swap_chunk(&slot_id, &html, &nonce)
            }
            .boxed(),
        );

        format!(
            r#"<div id="{id}" data-deferred-slot>{}</div>"#,
            fallback.unwrap_or_default()
        )
    }
}

/// Replacement chunk for one slot.
fn swap_chunk(id: &str, html: &str, nonce: &str) -> String {
    format!(
        r#"<template data-slot-for="{id}">{html}</template><script nonce="{nonce}">__swapSlot("{id}")</script>"#
    )
}

/// A page response whose body streams deferred sections as they settle.
pub struct StreamedPage {
    head: String,
    slots: Slots,
    cache_control: Option<&'static str>,
}

impl StreamedPage {
    /// Stream `head`, then every slot in settlement order, then the tail.
    #[must_use]
    pub const fn new(head: String, slots: Slots) -> Self {
        Self {
            head,
            slots,
            cache_control: None,
        }
    }

    /// Set the `Cache-Control` header. Cacheable pages also vary on the
    /// session cookie.
    #[must_use]
    pub const fn cache_control(mut self, value: &'static str) -> Self {
        self.cache_control = Some(value);
        self
    }

    /// Body chunks in write order. Dropping the stream drops every pending
    /// slot and with it the last handle to each deferred fetch.
    pub fn into_chunks(self) -> impl futures::Stream<Item = String> + Send + 'static {
        let swaps: FuturesUnordered<_> = self.slots.pending.into_iter().collect();

        stream::once(futures::future::ready(self.head))
            .chain(swaps)
            .chain(stream::once(futures::future::ready(
                DOCUMENT_TAIL.to_string(),
            )))
    }
}

impl IntoResponse for StreamedPage {
    fn into_response(self) -> Response {
        let cache_control = self.cache_control;
        let body = Body::from_stream(self.into_chunks().map(Ok::<_, Infallible>));

        let mut response = body.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        if let Some(value) = cache_control {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(value));
            headers.insert(header::VARY, HeaderValue::from_static("cookie"));
        }
        response
    }
}
