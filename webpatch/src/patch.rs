//! The patch entry-point model.
//!
//! A [`Patch`] pairs its immutable [`PatchMeta`] descriptor with a
//! type-erased initialization entry point. Patches are discovered at
//! startup from [`PatchRegistration`]s submitted with
//! [`inventory::submit!`], or registered explicitly on a
//! [`RegistryBuilder`].
//!
//! [`RegistryBuilder`]: crate::registry::RegistryBuilder

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use webpatch_core::{BoxError, PatchMeta, PatchSettings};
use webpatch_dom::Page;

/// The type-erased future returned by patch entry points.
pub type InitFuture = BoxFuture<'static, Result<(), BoxError>>;

type EntryPoint = Arc<dyn Fn(PatchContext) -> InitFuture + Send + Sync>;

/// Everything a patch's entry point receives: the host page and its
/// resolved settings.
#[derive(Clone)]
pub struct PatchContext {
    /// The page the patch runs against.
    pub page: Arc<Page>,
    /// Settings resolved per the patch's declared schema.
    pub settings: PatchSettings,
}

/// An independent, declaratively-gated unit of page-modification logic.
pub struct Patch {
    /// Build-time metadata; everything the dispatcher gates on.
    pub meta: PatchMeta,
    init: EntryPoint,
    cleanup: Option<EntryPoint>,
}

impl Patch {
    /// Create a patch from its descriptor and initialization entry point.
    pub fn new<F, Fut>(meta: PatchMeta, init: F) -> Self
    where
        F: Fn(PatchContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            meta,
            init: Arc::new(move |ctx| Box::pin(init(ctx))),
            cleanup: None,
        }
    }

    /// Attach a cleanup entry point for releasing resources (aborting
    /// in-flight waits, removing injected elements).
    ///
    /// Part of the patch-author contract, but the dispatcher does not
    /// currently invoke it on navigation or toggle-off; callers that need
    /// teardown run it themselves via [`run_cleanup`](Self::run_cleanup).
    pub fn with_cleanup<F, Fut>(mut self, cleanup: F) -> Self
    where
        F: Fn(PatchContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.cleanup = Some(Arc::new(move |ctx| Box::pin(cleanup(ctx))));
        self
    }

    /// Launch the initialization entry point.
    pub fn run_init(&self, ctx: PatchContext) -> InitFuture {
        (self.init)(ctx)
    }

    /// Launch the cleanup entry point, when one is declared.
    pub fn run_cleanup(&self, ctx: PatchContext) -> Option<InitFuture> {
        self.cleanup.as_ref().map(|cleanup| cleanup(ctx))
    }
}

impl std::fmt::Debug for Patch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patch")
            .field("id", &self.meta.id)
            .field("name", &self.meta.name)
            .finish_non_exhaustive()
    }
}

/// A compile-time patch registration.
///
/// Submit one per patch:
///
/// ```rust,ignore
/// inventory::submit! {
///     PatchRegistration { build: my_patch }
/// }
///
/// fn my_patch() -> Patch {
///     Patch::new(meta(), |ctx| async move { /* ... */ Ok(()) })
/// }
/// ```
pub struct PatchRegistration {
    /// Factory producing the patch; invoked once at registry collection.
    pub build: fn() -> Patch,
}

inventory::collect!(PatchRegistration);

/// Instantiate every patch submitted via [`inventory::submit!`], in link
/// order.
pub fn discovered_patches() -> Vec<Patch> {
    inventory::iter::<PatchRegistration>
        .into_iter()
        .map(|registration| (registration.build)())
        .collect()
}
