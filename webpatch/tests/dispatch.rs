mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{URL, dispatcher, dispatcher_with};
use webpatch::testing::{cancelled_patch, counting_patch, failing_patch, meta, recording_patch};
use webpatch::{
    DeviceScope, DeviceType, DispatchPass, MemoryStore, PatchMeta, RunAt, RunPolicy, SettingDef,
    SettingKind, SettingValue, SettingsStore, StoreError, UrlPattern, World,
};

fn default_pass() -> DispatchPass {
    DispatchPass::new(World::Isolated, RunAt::DocumentIdle, URL, DeviceType::Desktop)
}

#[tokio::test]
async fn launches_only_patches_matching_world_and_timing() {
    let (isolated, isolated_runs) = counting_patch(meta("isolated").build().unwrap());
    let (main_world, main_runs) =
        counting_patch(meta("main").world(World::Main).build().unwrap());
    let (early, early_runs) =
        counting_patch(meta("early").run_at(RunAt::DocumentStart).build().unwrap());

    let dispatcher = dispatcher(vec![isolated, main_world, early]);
    dispatcher.dispatch(&default_pass()).await;
    dispatcher.settle().await;

    assert_eq!(isolated_runs.load(Ordering::SeqCst), 1);
    assert_eq!(main_runs.load(Ordering::SeqCst), 0);
    assert_eq!(early_runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn launches_only_patches_matching_the_url() {
    // Built directly: the testing helper's preloaded pattern matches
    // every URL, which is exactly what this test must not have.
    let scoped = PatchMeta::builder("scoped", "scoped")
        .match_url(UrlPattern::new(r"^https://example\.com/settings").unwrap())
        .build()
        .unwrap();
    // First pattern misses, second matches: any-of semantics.
    let multi = PatchMeta::builder("multi", "multi")
        .match_url(UrlPattern::new(r"^https://other\.example/").unwrap())
        .match_url(UrlPattern::new(r"^https://example\.com/").unwrap())
        .build()
        .unwrap();
    let (scoped, scoped_runs) = counting_patch(scoped);
    let (multi, multi_runs) = counting_patch(multi);

    let dispatcher = dispatcher(vec![scoped, multi]);
    dispatcher.dispatch(&default_pass()).await;
    dispatcher.settle().await;

    assert_eq!(scoped_runs.load(Ordering::SeqCst), 0);
    assert_eq!(multi_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn respects_device_scope() {
    let desktop_only = meta("desktop-only")
        .device_scope(DeviceScope::DESKTOP)
        .build()
        .unwrap();
    let (patch, runs) = counting_patch(desktop_only);

    let dispatcher = dispatcher(vec![patch]);
    let mobile_pass = DispatchPass::new(
        World::Isolated,
        RunAt::DocumentIdle,
        URL,
        DeviceType::Mobile,
    );
    dispatcher.dispatch(&mobile_pass).await;
    dispatcher.settle().await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    dispatcher.dispatch(&default_pass()).await;
    dispatcher.settle().await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn skips_patches_disabled_in_the_store() {
    let store = Arc::new(MemoryStore::new());
    store.set_patch_enabled("off", false).await.unwrap();

    let (off, off_runs) = counting_patch(meta("off").build().unwrap());
    let (on, on_runs) = counting_patch(meta("on").build().unwrap());

    let dispatcher = dispatcher_with(vec![off, on], store);
    dispatcher.dispatch(&default_pass()).await;
    dispatcher.settle().await;

    assert_eq!(off_runs.load(Ordering::SeqCst), 0);
    assert_eq!(on_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn once_patches_run_a_single_time_across_passes() {
    let once = meta("once").run_policy(RunPolicy::Once).build().unwrap();
    let (once, once_runs) = counting_patch(once);
    let (every, every_runs) = counting_patch(meta("every").build().unwrap());

    let dispatcher = dispatcher(vec![once, every]);
    for _ in 0..3 {
        dispatcher.dispatch(&default_pass()).await;
    }
    dispatcher.settle().await;

    assert_eq!(once_runs.load(Ordering::SeqCst), 1);
    assert_eq!(every_runs.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn overlapping_passes_cannot_double_launch_a_once_patch() {
    let once = meta("once").run_policy(RunPolicy::Once).build().unwrap();
    let (once, once_runs) = counting_patch(once);

    let dispatcher = dispatcher(vec![once]);
    let pass_a = default_pass();
    let pass_b = default_pass();
    tokio::join!(dispatcher.dispatch(&pass_a), dispatcher.dispatch(&pass_b));
    dispatcher.settle().await;

    assert_eq!(once_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn settings_reach_the_patch_with_stored_values_over_defaults() {
    let descriptor = meta("styled")
        .setting(SettingDef::new(
            "accent",
            "Accent color",
            SettingKind::Color {
                default: "#ff0000".into(),
            },
        ))
        .setting(SettingDef::new(
            "compact",
            "Compact mode",
            SettingKind::Boolean { default: false },
        ))
        .build()
        .unwrap();
    let (patch, received) = recording_patch(descriptor);

    let store = Arc::new(MemoryStore::new());
    store
        .save_setting("styled", "accent", SettingValue::Color("#00ff00".into()))
        .await
        .unwrap();

    let dispatcher = dispatcher_with(vec![patch], store);
    dispatcher.dispatch(&default_pass()).await;
    dispatcher.settle().await;

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].color("accent"), Some("#00ff00"));
    assert_eq!(received[0].boolean("compact"), Some(false));
}

struct FailingStore;

#[async_trait::async_trait]
impl SettingsStore for FailingStore {
    async fn is_patch_enabled(&self, _patch_id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn set_patch_enabled(&self, _patch_id: &str, _enabled: bool) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn stored_settings(
        &self,
        _patch_id: &str,
    ) -> Result<std::collections::HashMap<String, SettingValue>, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn save_setting(
        &self,
        _patch_id: &str,
        _key: &str,
        _value: SettingValue,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

#[tokio::test]
async fn store_failure_skips_the_patch_without_failing_the_pass() {
    let (patch, runs) = counting_patch(meta("any").build().unwrap());

    let dispatcher = dispatcher_with(vec![patch], Arc::new(FailingStore));
    dispatcher.dispatch(&default_pass()).await;
    dispatcher.settle().await;

    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_failing_patch_does_not_affect_its_siblings() {
    let failing = failing_patch(meta("broken").build().unwrap(), "selector never appeared");
    let (healthy, healthy_runs) = counting_patch(meta("healthy").build().unwrap());

    let dispatcher = dispatcher(vec![failing, healthy]);
    dispatcher.dispatch(&default_pass()).await;
    dispatcher.settle().await;

    assert_eq!(healthy_runs.load(Ordering::SeqCst), 1);

    // The failure is contained per pass: a later pass still launches both.
    dispatcher.dispatch(&default_pass()).await;
    dispatcher.settle().await;
    assert_eq!(healthy_runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cancellation_is_absorbed_like_success() {
    let cancelled = cancelled_patch(meta("cancelled").build().unwrap());
    let (sibling, sibling_runs) = counting_patch(meta("sibling").build().unwrap());

    let dispatcher = dispatcher(vec![cancelled, sibling]);
    dispatcher.dispatch(&default_pass()).await;
    dispatcher.settle().await;

    assert_eq!(sibling_runs.load(Ordering::SeqCst), 1);
}
