//! Error types for the webpatch data model.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`StoreError`] - Settings persistence failures
//! - [`MetaError`] - Patch descriptor validation failures
//! - [`PatternError`] - Invalid URL patterns

use thiserror::Error;

/// A boxed error type for dynamic error handling.
///
/// Patch initialization entry points return this so their concrete error
/// types never leak into the dispatcher.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from the settings persistence backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend reported a failure.
    #[error("settings backend error: {0}")]
    Backend(#[source] BoxError),

    /// The backend is not reachable.
    #[error("settings backend unavailable")]
    Unavailable,
}

impl From<BoxError> for StoreError {
    fn from(err: BoxError) -> Self {
        StoreError::Backend(err)
    }
}

/// Validation errors raised while building a [`PatchMeta`].
///
/// These are misuse errors: they indicate a bug in a patch definition and
/// are not expected to occur in correct patch code.
///
/// [`PatchMeta`]: crate::PatchMeta
#[derive(Error, Debug)]
pub enum MetaError {
    /// The patch id is empty.
    #[error("patch id must not be empty")]
    EmptyId,

    /// The patch declares no URL patterns and could never run.
    #[error("patch \"{patch}\" declares no URL patterns")]
    NoMatches {
        /// Id of the offending patch.
        patch: String,
    },

    /// Two settings in one patch share an id.
    #[error("duplicate setting id \"{setting}\" in patch \"{patch}\"")]
    DuplicateSetting {
        /// Id of the offending patch.
        patch: String,
        /// The repeated setting id.
        setting: String,
    },
}

/// A URL pattern failed to compile.
#[derive(Error, Debug)]
#[error("invalid URL pattern \"{pattern}\"")]
pub struct PatternError {
    /// The pattern as written.
    pub pattern: String,
    /// The underlying regex error.
    #[source]
    pub source: regex::Error,
}
