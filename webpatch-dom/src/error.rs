//! Terminal outcomes of waiting primitives.

use thiserror::Error;

/// Failure of a synchronization primitive.
///
/// Every waiting primitive ends in exactly one of three states: resolved,
/// [`Cancelled`], or [`Detached`]. The two failures are distinct kinds on
/// purpose — callers (and the dispatcher) match on the variant rather than
/// on error identity. Cancellation is the expected outcome of a caller
/// aborting its own wait; detachment is a genuine failure.
///
/// [`Cancelled`]: ObserveError::Cancelled
/// [`Detached`]: ObserveError::Detached
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveError {
    /// The abort signal fired before the wait resolved.
    #[error("wait aborted by cancellation signal")]
    Cancelled,

    /// The observed subtree was removed from the document before the wait
    /// resolved.
    #[error("observed subtree detached before resolution")]
    Detached,
}

impl ObserveError {
    /// Whether this is the cancellation kind.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ObserveError::Cancelled)
    }
}
