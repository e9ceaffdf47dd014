mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::drain;
use webpatch::testing::{counting_patch, meta};
use webpatch::{
    MemoryStore, Page, PatchDispatcher, RegistryBuilder, RunAt, RunPolicy, SettingsStore, World,
};

#[tokio::test]
async fn session_dispatches_on_start_and_after_every_navigation() {
    let once = meta("banner").run_policy(RunPolicy::Once).build().unwrap();
    let (once, once_runs) = counting_patch(once);
    let (recurring, recurring_runs) = counting_patch(meta("feed").build().unwrap());

    let registry = RegistryBuilder::new()
        .register(once)
        .register(recurring)
        .build()
        .unwrap();
    let page = Arc::new(Page::with_navigation_api("https://example.com/"));
    let dispatcher = Arc::new(PatchDispatcher::new(
        registry,
        Arc::new(MemoryStore::new()),
        Arc::clone(&page),
    ));

    let session = webpatch::Session::start(
        Arc::clone(&dispatcher),
        World::Isolated,
        RunAt::DocumentIdle,
    )
    .await;
    dispatcher.settle().await;
    assert_eq!(once_runs.load(Ordering::SeqCst), 1);
    assert_eq!(recurring_runs.load(Ordering::SeqCst), 1);

    page.navigate("https://example.com/a");
    page.navigate("https://example.com/b");
    drain().await;
    dispatcher.settle().await;

    // The once patch keeps its mark across navigations.
    assert_eq!(once_runs.load(Ordering::SeqCst), 1);
    assert_eq!(recurring_runs.load(Ordering::SeqCst), 3);
    session.shutdown();
}

#[tokio::test]
async fn session_scopes_passes_to_the_navigated_url() {
    // Built directly so the only pattern is the narrow one.
    let scoped = webpatch::PatchMeta::builder("settings-page", "settings-page")
        .match_url(webpatch::UrlPattern::new(r"^https://example\.com/settings").unwrap())
        .build()
        .unwrap();
    let (scoped, scoped_runs) = counting_patch(scoped);

    let registry = RegistryBuilder::new().register(scoped).build().unwrap();
    let page = Arc::new(Page::with_navigation_api("https://example.com/"));
    let dispatcher = Arc::new(PatchDispatcher::new(
        registry,
        Arc::new(MemoryStore::new()),
        Arc::clone(&page),
    ));

    let _session = webpatch::Session::start(
        Arc::clone(&dispatcher),
        World::Isolated,
        RunAt::DocumentIdle,
    )
    .await;
    dispatcher.settle().await;
    assert_eq!(scoped_runs.load(Ordering::SeqCst), 0);

    page.navigate("https://example.com/settings");
    drain().await;
    dispatcher.settle().await;
    assert_eq!(scoped_runs.load(Ordering::SeqCst), 1);

    page.navigate("https://example.com/feed");
    drain().await;
    dispatcher.settle().await;
    assert_eq!(scoped_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn shutdown_stops_redispatching_but_not_running_patches() {
    let (patch, runs) = counting_patch(meta("feed").build().unwrap());
    let registry = RegistryBuilder::new().register(patch).build().unwrap();
    let page = Arc::new(Page::with_navigation_api("https://example.com/"));
    let dispatcher = Arc::new(PatchDispatcher::new(
        registry,
        Arc::new(MemoryStore::new()),
        Arc::clone(&page),
    ));

    let session = webpatch::Session::start(
        Arc::clone(&dispatcher),
        World::Isolated,
        RunAt::DocumentIdle,
    )
    .await;
    dispatcher.settle().await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    session.shutdown();
    drain().await;

    page.navigate("https://example.com/a");
    drain().await;
    dispatcher.settle().await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_fresh_dispatcher_resets_the_once_set() {
    let build_dispatcher = |page: &Arc<Page>| {
        let once = meta("banner").run_policy(RunPolicy::Once).build().unwrap();
        let (once, runs) = counting_patch(once);
        let registry = RegistryBuilder::new().register(once).build().unwrap();
        let store: Arc<dyn SettingsStore> = Arc::new(MemoryStore::new());
        (
            Arc::new(PatchDispatcher::new(registry, store, Arc::clone(page))),
            runs,
        )
    };

    let page = Arc::new(Page::with_navigation_api("https://example.com/"));

    let (first, first_runs) = build_dispatcher(&page);
    let session = webpatch::Session::start(first.clone(), World::Isolated, RunAt::DocumentIdle).await;
    first.settle().await;
    assert_eq!(first_runs.load(Ordering::SeqCst), 1);
    session.shutdown();

    // The analog of a full page reload: new dispatcher, clean slate.
    let (second, second_runs) = build_dispatcher(&page);
    let _session = webpatch::Session::start(second.clone(), World::Isolated, RunAt::DocumentIdle).await;
    second.settle().await;
    assert_eq!(second_runs.load(Ordering::SeqCst), 1);
}
