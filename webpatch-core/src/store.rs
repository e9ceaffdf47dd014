//! Settings persistence abstraction.
//!
//! The engine never talks to a concrete storage backend. It consumes the
//! [`SettingsStore`] trait for two things: the per-patch enable switch
//! (default enabled when unrecorded) and the raw stored setting values,
//! which [`resolve_settings`] merges with each patch's declared defaults.
//!
//! [`MemoryStore`] is the in-process implementation used by tests and
//! embedders without a persistence layer.

use crate::error::StoreError;
use crate::meta::PatchMeta;
use crate::setting::{PatchSettings, SettingValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Async key-value persistence for patch enablement and settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Whether the patch is enabled. Unrecorded patches default to `true`.
    async fn is_patch_enabled(&self, patch_id: &str) -> Result<bool, StoreError>;

    /// Record the enabled state of a patch.
    async fn set_patch_enabled(&self, patch_id: &str, enabled: bool) -> Result<(), StoreError>;

    /// Raw stored setting values for a patch, possibly partial or stale.
    async fn stored_settings(
        &self,
        patch_id: &str,
    ) -> Result<HashMap<String, SettingValue>, StoreError>;

    /// Persist one setting value.
    async fn save_setting(
        &self,
        patch_id: &str,
        setting_id: &str,
        value: SettingValue,
    ) -> Result<(), StoreError>;

    /// Flip the enabled state and return the new state.
    async fn toggle_patch(&self, patch_id: &str) -> Result<bool, StoreError> {
        let next = !self.is_patch_enabled(patch_id).await?;
        self.set_patch_enabled(patch_id, next).await?;
        Ok(next)
    }
}

/// Resolve a patch's declared settings against the store.
///
/// For each declaration: the stored value if one exists and has the
/// expected shape, else the declared default. A patch without a schema
/// resolves to the empty settings object without touching the store.
pub async fn resolve_settings(
    store: &dyn SettingsStore,
    meta: &PatchMeta,
) -> Result<PatchSettings, StoreError> {
    if meta.settings.is_empty() {
        return Ok(PatchSettings::empty());
    }

    let stored = store.stored_settings(&meta.id).await?;
    let mut settings = PatchSettings::empty();
    for def in &meta.settings {
        let value = match stored.get(&def.id) {
            Some(value) if def.kind.accepts(value) => value.clone(),
            _ => def.kind.default_value(),
        };
        settings.insert(def.id.clone(), value);
    }
    Ok(settings)
}

#[derive(Default)]
struct MemoryStoreInner {
    enabled: HashMap<String, bool>,
    settings: HashMap<String, HashMap<String, SettingValue>>,
}

/// An in-memory [`SettingsStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn is_patch_enabled(&self, patch_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock().enabled.get(patch_id).copied().unwrap_or(true))
    }

    async fn set_patch_enabled(&self, patch_id: &str, enabled: bool) -> Result<(), StoreError> {
        self.lock().enabled.insert(patch_id.to_string(), enabled);
        Ok(())
    }

    async fn stored_settings(
        &self,
        patch_id: &str,
    ) -> Result<HashMap<String, SettingValue>, StoreError> {
        Ok(self
            .lock()
            .settings
            .get(patch_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_setting(
        &self,
        patch_id: &str,
        setting_id: &str,
        value: SettingValue,
    ) -> Result<(), StoreError> {
        self.lock()
            .settings
            .entry(patch_id.to_string())
            .or_default()
            .insert(setting_id.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::UrlPattern;
    use crate::setting::{SettingDef, SettingKind};

    fn meta_with_settings() -> PatchMeta {
        PatchMeta::builder("avg", "Average")
            .match_url(UrlPattern::new(".*").unwrap())
            .setting(SettingDef::new(
                "precision",
                "Precision",
                SettingKind::Number {
                    default: 2.0,
                    min: Some(0.0),
                    max: Some(6.0),
                    step: Some(1.0),
                },
            ))
            .setting(SettingDef::new(
                "label",
                "Label",
                SettingKind::Text {
                    default: "avg".into(),
                },
            ))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn unrecorded_patch_is_enabled() {
        let store = MemoryStore::new();
        assert!(store.is_patch_enabled("anything").await.unwrap());
    }

    #[tokio::test]
    async fn toggle_round_trip() {
        let store = MemoryStore::new();
        assert!(!store.toggle_patch("avg").await.unwrap());
        assert!(!store.is_patch_enabled("avg").await.unwrap());
        assert!(store.toggle_patch("avg").await.unwrap());
    }

    #[tokio::test]
    async fn resolution_prefers_stored_values() {
        let store = MemoryStore::new();
        store
            .save_setting("avg", "precision", SettingValue::Number(4.0))
            .await
            .unwrap();

        let settings = resolve_settings(&store, &meta_with_settings()).await.unwrap();
        assert_eq!(settings.number("precision"), Some(4.0));
        assert_eq!(settings.text("label"), Some("avg"));
    }

    #[tokio::test]
    async fn resolution_discards_mismatched_values() {
        let store = MemoryStore::new();
        store
            .save_setting("avg", "precision", SettingValue::Text("four".into()))
            .await
            .unwrap();

        let settings = resolve_settings(&store, &meta_with_settings()).await.unwrap();
        assert_eq!(settings.number("precision"), Some(2.0));
    }

    #[tokio::test]
    async fn empty_schema_resolves_empty() {
        let store = MemoryStore::new();
        let meta = PatchMeta::builder("bare", "Bare")
            .match_url(UrlPattern::new(".*").unwrap())
            .build()
            .unwrap();
        let settings = resolve_settings(&store, &meta).await.unwrap();
        assert!(settings.is_empty());
    }
}
