//! # webpatch-dom
//!
//! The host-page model and DOM synchronization primitives for webpatch.
//!
//! This crate provides:
//! - **Element tree**: [`Document`], [`Node`] — an in-memory mutable DOM
//!   with connectivity tracking
//! - **Mutation observation**: [`MutationObserver`], [`ObserverOptions`],
//!   [`MutationRecord`] — batched change notification with idempotent,
//!   race-safe disconnect
//! - **Waiting primitives**: [`wait_for_render`], [`wait_for_replacement`]
//! - **Watching primitives**: [`watch_element`],
//!   [`watch_element_replacement`], [`WatchGuard`]
//! - **Construction**: [`ElementBuilder`]
//! - **Host surface**: [`Page`] — document + URL + viewport + navigation
//!   streams
//!
//! # Observer lifetimes
//!
//! The load-bearing invariant: no dangling observers. Every registration
//! ends via explicit disconnect (abort signal or [`WatchGuard`]),
//! detachment of the observed subtree, or disconnect at the moment of
//! normal resolution — and [`Document::observer_count`] lets tests assert
//! it. Cancellation uses `tokio_util::sync::CancellationToken`; an aborted
//! wait fails with [`ObserveError::Cancelled`], distinct from
//! [`ObserveError::Detached`].

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod builder;
mod document;
mod error;
mod node;
mod page;
mod wait;
mod watch;

// Re-exports
pub use builder::ElementBuilder;
pub use document::{
    Document, MutationKind, MutationObserver, MutationRecord, ObserverHandle, ObserverOptions,
};
pub use error::ObserveError;
pub use node::Node;
pub use page::{DEFAULT_VIEWPORT_WIDTH, Page};
pub use wait::{wait_for_render, wait_for_replacement};
pub use watch::{WatchGuard, watch_element, watch_element_replacement};
