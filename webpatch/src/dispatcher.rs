//! The patch dispatcher.
//!
//! One [`dispatch`] call is a *dispatch pass*: a full evaluation of the
//! registry against the current execution context, URL, and device,
//! triggered by initial page load or by a navigation. Eligible patches
//! are launched as independent tasks — the pass never awaits them — and
//! each task's failure is caught at its own boundary, so no patch can
//! affect its siblings, later passes, or the caller.
//!
//! Passes may overlap in time. A slow `OnUrlChange` patch can still be
//! initializing when the next navigation launches a fresh instance of it;
//! that is permitted by design, and any per-patch idempotency is the
//! patch's own responsibility. `Once` patches are protected from the
//! overlap race by checking and marking the executed set under one lock,
//! with no suspension point in between.
//!
//! [`dispatch`]: PatchDispatcher::dispatch

use crate::patch::PatchContext;
use crate::registry::PatchRegistry;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};
use webpatch_core::{
    BoxError, DeviceType, RunAt, RunPolicy, SettingsStore, World, resolve_settings,
};
use webpatch_dom::{ObserveError, Page};

/// The coordinates of one dispatch pass.
#[derive(Debug, Clone)]
pub struct DispatchPass {
    /// Script world this pass serves.
    pub world: World,
    /// Load-phase timing this pass serves.
    pub run_at: RunAt,
    /// URL at the time the pass was triggered.
    pub url: String,
    /// Device class at the time the pass was triggered.
    pub device: DeviceType,
}

impl DispatchPass {
    /// A pass with explicit coordinates.
    pub fn new(world: World, run_at: RunAt, url: impl Into<String>, device: DeviceType) -> Self {
        Self {
            world,
            run_at,
            url: url.into(),
            device,
        }
    }

    /// A pass reading URL and device from the page.
    pub fn for_page(page: &Page, world: World, run_at: RunAt) -> Self {
        Self::new(world, run_at, page.url(), page.device_type())
    }
}

/// Selects, gates, and launches patches.
///
/// Session state (the once-per-session executed set, the in-flight task
/// handles) is instance state: tests construct isolated dispatchers
/// without cross-test leakage.
pub struct PatchDispatcher {
    registry: PatchRegistry,
    store: Arc<dyn SettingsStore>,
    page: Arc<Page>,
    executed_once: Mutex<HashSet<String>>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl PatchDispatcher {
    /// Create a dispatcher over a registry, a settings store, and a page.
    pub fn new(registry: PatchRegistry, store: Arc<dyn SettingsStore>, page: Arc<Page>) -> Self {
        Self {
            registry,
            store,
            page,
            executed_once: Mutex::new(HashSet::new()),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// The page this dispatcher serves.
    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    fn executed_once(&self) -> MutexGuard<'_, HashSet<String>> {
        self.executed_once
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one dispatch pass.
    ///
    /// Awaits only the settings store; every eligible patch's
    /// initialization is launched as an independent task and not awaited.
    /// Returns once all eligible patches have been launched.
    pub async fn dispatch(&self, pass: &DispatchPass) {
        for patch in self.registry.iter() {
            let meta = &patch.meta;
            if meta.world != pass.world || meta.run_at != pass.run_at {
                continue;
            }
            if !meta.matches_url(&pass.url) {
                continue;
            }
            if !meta.device_scope.allows(pass.device) {
                trace!(patch = %meta.id, device = ?pass.device, "out of device scope");
                continue;
            }

            match self.store.is_patch_enabled(&meta.id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(patch = %meta.id, "patch disabled, skipping");
                    continue;
                }
                Err(err) => {
                    warn!(patch = %meta.id, error = %err, "enablement lookup failed, skipping");
                    continue;
                }
            }

            if meta.run_policy == RunPolicy::Once {
                // Check-and-mark under one lock, before launch: two
                // overlapping passes must not both observe "not yet
                // executed".
                if !self.executed_once().insert(meta.id.clone()) {
                    continue;
                }
            }

            let settings = match resolve_settings(self.store.as_ref(), meta).await {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(patch = %meta.id, error = %err, "settings resolution failed, skipping");
                    continue;
                }
            };

            let ctx = PatchContext {
                page: Arc::clone(&self.page),
                settings,
            };
            let patch = Arc::clone(patch);
            let handle = tokio::spawn(async move {
                match patch.run_init(ctx).await {
                    Ok(()) => {}
                    Err(err) if is_cancellation(&err) => {
                        // A patch aborting its own in-flight wait is the
                        // expected outcome of its cleanup, not a failure.
                        trace!(patch = %patch.meta.id, "initialization cancelled");
                    }
                    Err(err) => {
                        error!(
                            patch_name = %patch.meta.name,
                            patch_id = %patch.meta.id,
                            error = %err,
                            "patch initialization failed"
                        );
                    }
                }
            });
            self.in_flight().push(handle);
        }
    }

    /// Await every currently in-flight patch initialization.
    ///
    /// Production dispatching is fire-and-forget; this exists so tests
    /// (and orderly shutdown) can observe quiescence. Initializations
    /// launched by passes that overlap a `settle` call are awaited too.
    pub async fn settle(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = self.in_flight().drain(..).collect();
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                let _ = handle.await;
            }
        }
    }
}

/// Whether the error's chain contains the observer cancellation kind.
fn is_cancellation(err: &BoxError) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err.as_ref());
    while let Some(err) = current {
        if let Some(observe) = err.downcast_ref::<ObserveError>() {
            if observe.is_cancellation() {
                return true;
            }
        }
        current = err.source();
    }
    false
}
