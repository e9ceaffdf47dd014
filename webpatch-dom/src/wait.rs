//! One-shot waiting primitives.
//!
//! Both operations take a *selector* — a closure returning the element of
//! interest, re-evaluated on every mutation batch and never memoized — and
//! an optional [`CancellationToken`]. Each ends in exactly one of three
//! states: resolved, [`ObserveError::Cancelled`], or
//! [`ObserveError::Detached`], and disconnects its observer on every exit
//! path.

use crate::document::{MutationObserver, ObserverOptions};
use crate::error::ObserveError;
use crate::node::Node;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Await the signal, or pend forever when there is none.
pub(crate) async fn aborted(signal: Option<&CancellationToken>) {
    match signal {
        Some(signal) => signal.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Wait until the selector first returns an element.
///
/// Resolves immediately — registering no observer — when the selector
/// already matches. Otherwise observes `root` (subtree, child-list) and
/// re-evaluates the selector on every batch. Prefer a narrow `root` over
/// the document root; every mutation under it wakes this wait.
///
/// Fails with [`ObserveError::Detached`] when `root` leaves the document
/// before resolution, or [`ObserveError::Cancelled`] when the signal
/// aborts first.
pub async fn wait_for_render<S>(
    selector: S,
    root: &Arc<Node>,
    signal: Option<&CancellationToken>,
) -> Result<(), ObserveError>
where
    S: Fn() -> Option<Arc<Node>> + Send + Sync,
{
    if let Some(signal) = signal {
        if signal.is_cancelled() {
            return Err(ObserveError::Cancelled);
        }
    }
    if selector().is_some() {
        return Ok(());
    }

    let mut observer = MutationObserver::observe(root, ObserverOptions::default());
    loop {
        tokio::select! {
            _ = aborted(signal) => {
                observer.disconnect();
                return Err(ObserveError::Cancelled);
            }
            batch = observer.next_batch() => {
                if batch.is_none() || !root.is_connected() {
                    observer.disconnect();
                    return Err(ObserveError::Detached);
                }
                if selector().is_some() {
                    observer.disconnect();
                    return Ok(());
                }
            }
        }
    }
}

/// Wait until the element currently matched by the selector is replaced.
///
/// Captures the selected element at call time; when none exists this
/// degrades to [`wait_for_render`]. Otherwise it waits until that exact
/// captured element is detached from the document — content changes inside
/// it do not count — and then waits for a fresh match, so the resolved
/// state always has the selector returning a currently-attached element.
///
/// Same failure modes as [`wait_for_render`] at each waiting stage.
pub async fn wait_for_replacement<S>(
    selector: S,
    root: &Arc<Node>,
    signal: Option<&CancellationToken>,
) -> Result<(), ObserveError>
where
    S: Fn() -> Option<Arc<Node>> + Send + Sync,
{
    if let Some(signal) = signal {
        if signal.is_cancelled() {
            return Err(ObserveError::Cancelled);
        }
    }

    let Some(initial) = selector() else {
        return wait_for_render(&selector, root, signal).await;
    };

    let mut observer = MutationObserver::observe(root, ObserverOptions::default());
    loop {
        tokio::select! {
            _ = aborted(signal) => {
                observer.disconnect();
                return Err(ObserveError::Cancelled);
            }
            batch = observer.next_batch() => {
                if batch.is_none() || !root.is_connected() {
                    observer.disconnect();
                    return Err(ObserveError::Detached);
                }
                if !initial.is_connected() {
                    observer.disconnect();
                    break;
                }
            }
        }
    }

    wait_for_render(&selector, root, signal).await
}
