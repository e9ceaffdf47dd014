//! Navigation detection.
//!
//! The trigger re-invokes its callback exactly once per observable
//! navigation, using the best signal the host page offers. With a native
//! navigation stream, every event is one navigation. Without one, the
//! trigger falls back to observing the full document subtree for any
//! mutation plus the history-pop stream, and compares the page URL to its
//! last-seen value — the comparison deduplicates, so mutation noise with
//! an unchanged URL never fires, and one logical navigation fires at most
//! once however many mutations accompany it.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use webpatch_dom::{MutationObserver, ObserverOptions, Page};

/// Re-invokes a callback once per detected in-page navigation.
pub struct NavigationTrigger {
    shutdown: CancellationToken,
}

impl NavigationTrigger {
    /// Start watching `page`, invoking `on_navigation` with the new URL
    /// after each navigation completes.
    pub fn spawn<F, Fut>(page: Arc<Page>, on_navigation: F) -> Self
    where
        F: FnMut(String) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move {
            run(page, on_navigation, token).await;
        });
        Self { shutdown }
    }

    /// Stop watching. The fallback's document observer is disconnected.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for NavigationTrigger {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run<F, Fut>(page: Arc<Page>, mut on_navigation: F, shutdown: CancellationToken)
where
    F: FnMut(String) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    match page.navigation_events() {
        Some(mut events) => loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                event = events.recv() => match event {
                    Ok(url) => on_navigation(url).await,
                    // Missed events collapse into one pass at the URL we
                    // ended up on.
                    Err(RecvError::Lagged(_)) => on_navigation(page.url()).await,
                    Err(RecvError::Closed) => return,
                },
            }
        },
        None => {
            debug!("no native navigation API, falling back to mutation observation");
            let mut observer =
                MutationObserver::observe(page.document().root(), ObserverOptions::all());
            let mut popstate = page.popstate_events();
            let mut last_seen = page.url();
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        observer.disconnect();
                        return;
                    }
                    batch = observer.next_batch() => {
                        if batch.is_none() {
                            return;
                        }
                        check_url(&page, &mut last_seen, &mut on_navigation).await;
                    }
                    event = popstate.recv() => {
                        if matches!(event, Err(RecvError::Closed)) {
                            observer.disconnect();
                            return;
                        }
                        check_url(&page, &mut last_seen, &mut on_navigation).await;
                    }
                }
            }
        }
    }
}

async fn check_url<F, Fut>(page: &Page, last_seen: &mut String, on_navigation: &mut F)
where
    F: FnMut(String) -> Fut + Send,
    Fut: Future<Output = ()> + Send,
{
    let url = page.url();
    if url != *last_seen {
        *last_seen = url.clone();
        on_navigation(url).await;
    }
}
