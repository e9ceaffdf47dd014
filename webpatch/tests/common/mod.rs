#![allow(dead_code)] // not every test binary uses every helper

use std::sync::Arc;

use webpatch::{MemoryStore, Page, Patch, PatchDispatcher, RegistryBuilder, SettingsStore};

pub const URL: &str = "https://example.com/feed";

/// A dispatcher over the given patches, a fresh page at [`URL`], and the
/// given store.
pub fn dispatcher_with(
    patches: Vec<Patch>,
    store: Arc<dyn SettingsStore>,
) -> Arc<PatchDispatcher> {
    let mut builder = RegistryBuilder::new();
    for patch in patches {
        builder = builder.register(patch);
    }
    let registry = builder.build().expect("unique patch ids");
    let page = Arc::new(Page::new(URL));
    Arc::new(PatchDispatcher::new(registry, store, page))
}

/// [`dispatcher_with`] over an empty in-memory store.
pub fn dispatcher(patches: Vec<Patch>) -> Arc<PatchDispatcher> {
    dispatcher_with(patches, Arc::new(MemoryStore::new()))
}

/// Yield repeatedly so spawned tasks and navigation triggers get to run.
pub async fn drain() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
