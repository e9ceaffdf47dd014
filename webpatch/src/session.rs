//! Content-script sessions.
//!
//! A [`Session`] is one (world, timing) entry point's lifetime on a page:
//! one initial dispatch pass, then re-dispatch on every detected
//! navigation. Session state — the once-per-session executed set — lives
//! in the dispatcher and spans navigations; it resets only when a fresh
//! dispatcher is constructed (the analog of a full page reload).

use crate::dispatcher::{DispatchPass, PatchDispatcher};
use crate::navigation::NavigationTrigger;
use std::sync::Arc;
use webpatch_core::{RunAt, World};

/// A running (world, timing) entry point.
pub struct Session {
    dispatcher: Arc<PatchDispatcher>,
    trigger: NavigationTrigger,
}

impl Session {
    /// Run the initial dispatch pass for `(world, run_at)` and start
    /// re-dispatching on navigation.
    pub async fn start(dispatcher: Arc<PatchDispatcher>, world: World, run_at: RunAt) -> Self {
        let page = Arc::clone(dispatcher.page());
        dispatcher
            .dispatch(&DispatchPass::for_page(&page, world, run_at))
            .await;

        let trigger_dispatcher = Arc::clone(&dispatcher);
        let trigger_page = Arc::clone(&page);
        let trigger = NavigationTrigger::spawn(page, move |url| {
            let dispatcher = Arc::clone(&trigger_dispatcher);
            let device = trigger_page.device_type();
            async move {
                dispatcher
                    .dispatch(&DispatchPass::new(world, run_at, url, device))
                    .await;
            }
        });

        Self {
            dispatcher,
            trigger,
        }
    }

    /// The dispatcher backing this session.
    pub fn dispatcher(&self) -> &Arc<PatchDispatcher> {
        &self.dispatcher
    }

    /// Stop re-dispatching on navigation. Already-launched patch
    /// initializations keep running.
    pub fn shutdown(&self) {
        self.trigger.shutdown();
    }
}
