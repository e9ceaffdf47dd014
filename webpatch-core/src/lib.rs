//! # webpatch-core
//!
//! Core data model and traits for the webpatch page-patching engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! patch crates and storage backends that don't need the full engine.
//!
//! # What lives here
//!
//! ## Descriptors ([`PatchMeta`])
//!
//! The immutable, build-time metadata of a patch: URL patterns, execution
//! world, load-phase timing, run policy, device scope, and the settings
//! schema. The builder applies defaults at construction so eligibility
//! checks downstream are plain comparisons — the default is decided once,
//! not re-derived at every filter site.
//!
//! ## Settings ([`SettingDef`], [`PatchSettings`])
//!
//! Typed setting declarations with defaults and constraints, and the
//! resolved settings object handed to a patch's initialization entry
//! point.
//!
//! ## Persistence ([`SettingsStore`])
//!
//! The async key-value abstraction the dispatcher queries for enablement
//! and stored setting values. [`resolve_settings`] merges stored values
//! with declared defaults. [`MemoryStore`] is the in-process
//! implementation.
//!
//! # Error Types
//!
//! - [`StoreError`] - persistence backend failures
//! - [`MetaError`] - descriptor validation failures (fail-fast misuse)
//! - [`PatternError`] - invalid URL patterns

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod meta;
mod setting;
mod store;

// Re-exports
pub use error::{BoxError, MetaError, PatternError, StoreError};
pub use meta::{
    DeviceScope, DeviceType, MOBILE_VIEWPORT_CUTOFF, PatchMeta, PatchMetaBuilder, RunAt,
    RunPolicy, UrlPattern, World,
};
pub use setting::{PatchSettings, SelectOption, SettingDef, SettingKind, SettingValue};
pub use store::{MemoryStore, SettingsStore, resolve_settings};
