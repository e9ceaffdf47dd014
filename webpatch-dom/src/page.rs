//! The host page.
//!
//! A [`Page`] bundles what a content script consumes from its host
//! environment: the document, the current URL, a viewport width for
//! device-scope filtering, and navigation signals. Pages come in two
//! flavors mirroring real hosts — with a native navigation-completed event
//! stream, or without one (in which case consumers fall back to mutation
//! observation plus the history-pop stream).

use crate::document::Document;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use webpatch_core::DeviceType;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Default viewport width for newly created pages.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

/// An in-memory host page.
pub struct Page {
    document: Document,
    url: Mutex<String>,
    viewport_width: AtomicU32,
    navigation_tx: Option<broadcast::Sender<String>>,
    popstate_tx: broadcast::Sender<String>,
}

impl Page {
    fn build(url: impl Into<String>, native_navigation: bool) -> Self {
        Self {
            document: Document::new(),
            url: Mutex::new(url.into()),
            viewport_width: AtomicU32::new(DEFAULT_VIEWPORT_WIDTH),
            navigation_tx: native_navigation
                .then(|| broadcast::channel(EVENT_CHANNEL_CAPACITY).0),
            popstate_tx: broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
        }
    }

    /// A page whose host exposes no native navigation event.
    pub fn new(url: impl Into<String>) -> Self {
        Self::build(url, false)
    }

    /// A page whose host exposes a navigation-completed event stream.
    pub fn with_navigation_api(url: impl Into<String>) -> Self {
        Self::build(url, true)
    }

    fn url_slot(&self) -> MutexGuard<'_, String> {
        self.url.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The page's document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The current URL.
    pub fn url(&self) -> String {
        self.url_slot().clone()
    }

    /// The viewport width in pixels.
    pub fn viewport_width(&self) -> u32 {
        self.viewport_width.load(Ordering::SeqCst)
    }

    /// Resize the viewport.
    pub fn set_viewport_width(&self, width: u32) {
        self.viewport_width.store(width, Ordering::SeqCst);
    }

    /// Device class of the current viewport.
    pub fn device_type(&self) -> DeviceType {
        DeviceType::from_viewport_width(self.viewport_width())
    }

    /// Complete an in-page navigation: update the URL and, when the host
    /// has a native navigation API, emit on its stream. Without one, the
    /// change becomes visible to fallback consumers on the next document
    /// mutation.
    pub fn navigate(&self, url: impl Into<String>) {
        let url = url.into();
        *self.url_slot() = url.clone();
        if let Some(tx) = &self.navigation_tx {
            let _ = tx.send(url);
        }
    }

    /// Complete a history-pop navigation: update the URL and emit on the
    /// popstate stream.
    pub fn pop_state(&self, url: impl Into<String>) {
        let url = url.into();
        *self.url_slot() = url.clone();
        let _ = self.popstate_tx.send(url);
    }

    /// Subscribe to the native navigation stream, when the host has one.
    pub fn navigation_events(&self) -> Option<broadcast::Receiver<String>> {
        self.navigation_tx.as_ref().map(|tx| tx.subscribe())
    }

    /// Subscribe to history-pop navigations.
    pub fn popstate_events(&self) -> broadcast::Receiver<String> {
        self.popstate_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn navigate_emits_on_the_native_stream() {
        let page = Page::with_navigation_api("https://example.com/");
        let mut events = page.navigation_events().unwrap();

        page.navigate("https://example.com/feed");
        assert_eq!(page.url(), "https://example.com/feed");
        assert_eq!(events.recv().await.unwrap(), "https://example.com/feed");
    }

    #[test]
    fn plain_pages_have_no_native_stream() {
        let page = Page::new("https://example.com/");
        assert!(page.navigation_events().is_none());
    }

    #[tokio::test]
    async fn pop_state_emits_on_the_popstate_stream() {
        let page = Page::new("https://example.com/a");
        let mut events = page.popstate_events();

        page.pop_state("https://example.com/b");
        assert_eq!(events.recv().await.unwrap(), "https://example.com/b");
    }

    #[test]
    fn device_type_tracks_viewport() {
        let page = Page::new("https://example.com/");
        assert_eq!(page.device_type(), DeviceType::Desktop);
        page.set_viewport_width(400);
        assert_eq!(page.device_type(), DeviceType::Mobile);
    }
}
