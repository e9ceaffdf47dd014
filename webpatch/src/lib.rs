//! # webpatch - Patch Dispatch for Single-Page Applications
//!
//! `webpatch` injects small, independent behavioral modifications
//! ("patches") into pages, deciding *whether*, *when*, and *with what
//! isolation* each patch's initialization runs — across full page loads
//! and SPA navigations that never reload.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use webpatch::prelude::*;
//!
//! fn dim_header() -> Patch {
//!     let meta = PatchMeta::builder("dim-header", "Dim header")
//!         .match_url(UrlPattern::new(r"^https://example\.com/").unwrap())
//!         .build()
//!         .unwrap();
//!     Patch::new(meta, |ctx| async move {
//!         let root = ctx.page.document().root().clone();
//!         wait_for_render(move || root.find_by_id("header"), &root, None).await?;
//!         // ... modify the element ...
//!         Ok(())
//!     })
//! }
//!
//! inventory::submit! { PatchRegistration { build: dim_header } }
//!
//! # async fn run(page: std::sync::Arc<Page>) {
//! let registry = PatchRegistry::discovered().unwrap();
//! let store = std::sync::Arc::new(MemoryStore::new());
//! let dispatcher = std::sync::Arc::new(PatchDispatcher::new(registry, store, page));
//! let session = Session::start(dispatcher, World::Isolated, RunAt::DocumentIdle).await;
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - A patch launches only when its world, timing, URL patterns, device
//!   scope, and stored enablement all allow it.
//! - A `Once` patch launches at most one time per session, even across
//!   overlapping dispatch passes.
//! - A patch's failure is logged and contained; siblings and later passes
//!   are unaffected. Cancellation of a patch's own waits is absorbed
//!   silently.
//! - Every DOM wait the patch starts is backed by an observer with a
//!   bounded lifetime — see [`webpatch_dom`]'s observer invariant.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod dispatcher;
mod navigation;
mod patch;
mod registry;
mod session;
pub mod testing;

pub use dispatcher::{DispatchPass, PatchDispatcher};
pub use navigation::NavigationTrigger;
pub use patch::{InitFuture, Patch, PatchContext, PatchRegistration, discovered_patches};
pub use registry::{PatchRegistry, RegistryBuilder, RegistryError};
pub use session::Session;

pub use webpatch_core::{
    // Errors
    BoxError,
    // Scope / classification
    DeviceScope,
    DeviceType,
    MOBILE_VIEWPORT_CUTOFF,
    // Settings store
    MemoryStore,
    MetaError,
    // Descriptors
    PatchMeta,
    PatchMetaBuilder,
    // Settings
    PatchSettings,
    PatternError,
    RunAt,
    RunPolicy,
    SelectOption,
    SettingDef,
    SettingKind,
    SettingValue,
    SettingsStore,
    StoreError,
    UrlPattern,
    World,
    resolve_settings,
};

pub use webpatch_dom::{
    Document, ElementBuilder, MutationKind, MutationObserver, MutationRecord, Node, ObserveError,
    ObserverHandle, ObserverOptions, Page, WatchGuard, wait_for_render, wait_for_replacement,
    watch_element, watch_element_replacement,
};

// Re-export so `inventory::submit!` resolves for downstream patch crates.
pub use inventory;

/// Prelude module - common imports for patch authors.
///
/// ```rust,ignore
/// use webpatch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::dispatcher::{DispatchPass, PatchDispatcher};
    pub use crate::patch::{Patch, PatchContext, PatchRegistration};
    pub use crate::registry::{PatchRegistry, RegistryBuilder};
    pub use crate::session::Session;
    pub use webpatch_core::{
        DeviceScope, DeviceType, MemoryStore, PatchMeta, PatchSettings, RunAt, RunPolicy,
        SettingDef, SettingKind, SettingValue, SettingsStore, UrlPattern, World,
    };
    pub use webpatch_dom::{
        ElementBuilder, Node, ObserveError, ObserverOptions, Page, WatchGuard, wait_for_render,
        wait_for_replacement, watch_element, watch_element_replacement,
    };
}
