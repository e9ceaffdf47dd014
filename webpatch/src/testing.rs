//! Testing utilities for webpatch.
//!
//! This module provides utilities to make testing dispatch behavior
//! easier:
//!
//! - [`counting_patch`]: a patch that counts its initializations
//! - [`recording_patch`]: a patch that records the settings it received
//! - [`failing_patch`]: a patch whose initialization always fails
//! - [`cancelled_patch`]: a patch whose initialization reports the
//!   observer cancellation kind
//! - [`meta`]: a minimal descriptor builder for tests

use crate::patch::Patch;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use webpatch_core::{PatchMeta, PatchMetaBuilder, PatchSettings, UrlPattern};
use webpatch_dom::ObserveError;

/// A descriptor builder preloaded with a match-everything URL pattern.
///
/// Callers chain further builder methods and `build()` it themselves.
/// Because `matches` is any-of, descriptors from this helper match every
/// URL regardless of patterns added on top; tests exercising URL scoping
/// build their descriptor with [`PatchMeta::builder`] directly.
pub fn meta(id: &str) -> PatchMetaBuilder {
    PatchMeta::builder(id, id).match_url(UrlPattern::new(".*").expect("valid pattern"))
}

/// A patch that counts how many times its initialization ran.
pub fn counting_patch(meta: PatchMeta) -> (Patch, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let patch = Patch::new(meta, move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    (patch, count)
}

/// A patch that records every settings object it was initialized with.
pub fn recording_patch(meta: PatchMeta) -> (Patch, Arc<Mutex<Vec<PatchSettings>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let patch = Patch::new(meta, move |ctx| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().expect("sink lock").push(ctx.settings);
            Ok(())
        }
    });
    (patch, received)
}

/// A patch whose initialization always fails with the given message.
pub fn failing_patch(meta: PatchMeta, message: &'static str) -> Patch {
    Patch::new(meta, move |_ctx| async move { Err(message.into()) })
}

/// A patch whose initialization ends in observer cancellation, the outcome
/// the dispatcher silently absorbs.
pub fn cancelled_patch(meta: PatchMeta) -> Patch {
    Patch::new(meta, |_ctx| async { Err(ObserveError::Cancelled.into()) })
}
