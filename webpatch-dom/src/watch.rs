//! Long-lived watching primitives.
//!
//! Unlike the one-shot waits, a watch keeps its observer alive in a
//! background task and invokes a callback per qualifying mutation batch.
//! The returned future resolves once setup is complete (after the first
//! callback invocation); the watch then runs until one of its terminal
//! events: the abort signal fires, the callback calls
//! [`WatchGuard::disconnect`], or the watched subtree detaches. All three
//! end the watch silently — detachment of a watched element is a normal
//! end-of-life event here, not a failure. No callback invocation ever
//! follows disconnect.

use crate::document::{MutationObserver, ObserverHandle, ObserverOptions};
use crate::error::ObserveError;
use crate::node::Node;
use crate::wait::{aborted, wait_for_render};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handed to watch callbacks; lets a callback end its own watch.
pub struct WatchGuard {
    handle: ObserverHandle,
}

impl WatchGuard {
    /// End the watch. Idempotent; no callback invocation follows.
    pub fn disconnect(&self) {
        self.handle.disconnect();
    }

    /// Whether the watch has ended.
    pub fn is_disconnected(&self) -> bool {
        self.handle.is_disconnected()
    }
}

/// Watch one element for mutations.
///
/// First waits for the selector to match (`root` bounds only that initial
/// wait), invokes `callback` once immediately upon acquiring the element —
/// first-state handling and change handling share one code path — then
/// observes that specific element with `options` (default: subtree +
/// child-list) and invokes `callback` per qualifying batch.
///
/// The watch self-terminates when the watched element is detached, when
/// `signal` aborts, or when the callback calls [`WatchGuard::disconnect`].
/// Errors surface only from the initial wait.
pub async fn watch_element<S, C>(
    selector: S,
    mut callback: C,
    root: &Arc<Node>,
    options: ObserverOptions,
    signal: Option<&CancellationToken>,
) -> Result<(), ObserveError>
where
    S: Fn() -> Option<Arc<Node>> + Send + Sync,
    C: FnMut(&WatchGuard) + Send + 'static,
{
    wait_for_render(&selector, root, signal).await?;
    // The element can vanish between resolution and this re-evaluation;
    // treat that as an immediately-ended watch.
    let Some(element) = selector() else {
        return Ok(());
    };

    // Observation begins only after the first invocation returns, so
    // mutations the callback itself performs are not redelivered to it.
    let setup_guard = WatchGuard {
        handle: ObserverHandle::unregistered(),
    };
    callback(&setup_guard);
    if setup_guard.is_disconnected() {
        return Ok(());
    }

    let observer = MutationObserver::observe(&element, options);
    let signal = signal.cloned();
    tokio::spawn(async move {
        run_element_watch(observer, element, callback, signal).await;
    });
    Ok(())
}

async fn run_element_watch<C>(
    mut observer: MutationObserver,
    element: Arc<Node>,
    mut callback: C,
    signal: Option<CancellationToken>,
) where
    C: FnMut(&WatchGuard) + Send,
{
    let guard = WatchGuard {
        handle: observer.handle(),
    };
    loop {
        tokio::select! {
            _ = aborted(signal.as_ref()) => {
                observer.disconnect();
                debug!(tag = element.tag(), "element watch aborted");
                return;
            }
            batch = observer.next_batch() => {
                if batch.is_none() {
                    return;
                }
                if !element.is_connected() {
                    observer.disconnect();
                    debug!(tag = element.tag(), "watched element detached, watch ended");
                    return;
                }
                callback(&guard);
                if guard.is_disconnected() {
                    return;
                }
            }
        }
    }
}

/// Watch for the element matched by the selector being replaced.
///
/// Long-lived analog of [`wait_for_replacement`]: observes `root` and, on
/// every batch, re-evaluates the selector; a match different by identity
/// from the last known element becomes the new tracked element and fires
/// `callback`. When an element is already matched at setup time, `callback`
/// fires once before observation begins.
///
/// `root` is required and never defaulted: this watch is unbounded in
/// time, and a narrow root bounds its mutation-observer overhead. The
/// watch ends silently when `root` detaches, when `signal` aborts, or when
/// the callback disconnects.
///
/// [`wait_for_replacement`]: crate::wait::wait_for_replacement
pub async fn watch_element_replacement<S, C>(
    selector: S,
    mut callback: C,
    root: &Arc<Node>,
    signal: Option<&CancellationToken>,
) -> Result<(), ObserveError>
where
    S: Fn() -> Option<Arc<Node>> + Send + Sync + 'static,
    C: FnMut(&WatchGuard) + Send + 'static,
{
    if let Some(signal) = signal {
        if signal.is_cancelled() {
            return Err(ObserveError::Cancelled);
        }
    }

    let current = selector();
    if current.is_some() {
        // Same sequencing as watch_element: the setup invocation runs
        // before observation begins.
        let setup_guard = WatchGuard {
            handle: ObserverHandle::unregistered(),
        };
        callback(&setup_guard);
        if setup_guard.is_disconnected() {
            return Ok(());
        }
    }

    let observer = MutationObserver::observe(root, ObserverOptions::default());
    let root = Arc::clone(root);
    let signal = signal.cloned();
    tokio::spawn(async move {
        run_replacement_watch(observer, selector, current, callback, root, signal).await;
    });
    Ok(())
}

async fn run_replacement_watch<S, C>(
    mut observer: MutationObserver,
    selector: S,
    mut current: Option<Arc<Node>>,
    mut callback: C,
    root: Arc<Node>,
    signal: Option<CancellationToken>,
) where
    S: Fn() -> Option<Arc<Node>> + Send + Sync,
    C: FnMut(&WatchGuard) + Send,
{
    let guard = WatchGuard {
        handle: observer.handle(),
    };
    loop {
        tokio::select! {
            _ = aborted(signal.as_ref()) => {
                observer.disconnect();
                debug!("replacement watch aborted");
                return;
            }
            batch = observer.next_batch() => {
                if batch.is_none() {
                    return;
                }
                if !root.is_connected() {
                    observer.disconnect();
                    debug!("replacement watch root detached, watch ended");
                    return;
                }
                let Some(next) = selector() else {
                    continue;
                };
                let replaced = match &current {
                    Some(tracked) => !Node::same(tracked, &next),
                    None => true,
                };
                if replaced {
                    current = Some(next);
                    callback(&guard);
                    if guard.is_disconnected() {
                        return;
                    }
                }
            }
        }
    }
}
