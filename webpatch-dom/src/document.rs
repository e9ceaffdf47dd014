//! The document and its mutation-observation machinery.
//!
//! Every mutating call on a [`Node`] produces a batch of
//! [`MutationRecord`]s which the owning [`Document`] routes to registered
//! observers. An observer sees a record when the record's kind is enabled
//! in its options and the record's target is its observed element or, with
//! `subtree`, any descendant of it.
//!
//! Observer lifetime is the load-bearing invariant of this crate: every
//! registration ends in exactly one way — explicit disconnect (from a
//! caller, an abort signal, or a watch callback), detachment
//! self-termination, or disconnect at the moment of normal resolution.
//! [`ObserverHandle::disconnect`] is idempotent; racing disconnects are
//! safe. Dropping a [`MutationObserver`] disconnects it, so a registration
//! can never outlive its consumer.

use crate::node::Node;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;

/// What changed in a [`MutationRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// A child was added to or removed from the target.
    ChildList,
    /// An attribute of the target changed.
    Attributes,
    /// The target's text content changed.
    CharacterData,
}

/// One observed mutation.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// What changed.
    pub kind: MutationKind,
    /// The element it changed on; for [`MutationKind::ChildList`], the
    /// parent whose child list changed.
    pub target: Arc<Node>,
}

/// Which mutations an observer receives.
#[derive(Debug, Clone, Copy)]
pub struct ObserverOptions {
    /// Observe the target's descendants, not just the target.
    pub subtree: bool,
    /// Receive child-list changes.
    pub child_list: bool,
    /// Receive attribute changes.
    pub attributes: bool,
    /// Receive text content changes.
    pub character_data: bool,
}

impl Default for ObserverOptions {
    /// Subtree plus child-list changes, the configuration every waiting
    /// primitive uses.
    fn default() -> Self {
        Self {
            subtree: true,
            child_list: true,
            attributes: false,
            character_data: false,
        }
    }
}

impl ObserverOptions {
    /// Every mutation kind, subtree included.
    pub fn all() -> Self {
        Self {
            subtree: true,
            child_list: true,
            attributes: true,
            character_data: true,
        }
    }

    fn wants(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::Attributes => self.attributes,
            MutationKind::CharacterData => self.character_data,
        }
    }
}

struct ObserverEntry {
    id: u64,
    target: Weak<Node>,
    options: ObserverOptions,
    tx: mpsc::UnboundedSender<Vec<MutationRecord>>,
    disconnected: Arc<AtomicBool>,
}

#[derive(Default)]
pub(crate) struct DocumentInner {
    observers: Mutex<Vec<ObserverEntry>>,
    next_observer_id: AtomicU64,
}

impl DocumentInner {
    fn observers(&self) -> MutexGuard<'_, Vec<ObserverEntry>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route one batch of records to every matching observer.
    pub(crate) fn notify(&self, records: &[MutationRecord]) {
        let mut observers = self.observers();
        observers.retain(|entry| {
            !entry.disconnected.load(Ordering::SeqCst) && entry.target.strong_count() > 0
        });
        for entry in observers.iter() {
            let Some(target) = entry.target.upgrade() else {
                continue;
            };
            let batch: Vec<MutationRecord> = records
                .iter()
                .filter(|record| {
                    entry.options.wants(record.kind)
                        && (Node::same(&target, &record.target)
                            || (entry.options.subtree && target.contains(&record.target)))
                })
                .cloned()
                .collect();
            if !batch.is_empty() {
                let _ = entry.tx.send(batch);
            }
        }
    }

    fn register(
        self: &Arc<Self>,
        target: &Arc<Node>,
        options: ObserverOptions,
    ) -> MutationObserver {
        let id = self.next_observer_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        let disconnected = Arc::new(AtomicBool::new(false));
        self.observers().push(ObserverEntry {
            id,
            target: Arc::downgrade(target),
            options,
            tx,
            disconnected: Arc::clone(&disconnected),
        });
        MutationObserver {
            handle: ObserverHandle {
                id,
                doc: Arc::downgrade(self),
                disconnected,
            },
            rx,
        }
    }

    fn unregister(&self, id: u64) {
        self.observers().retain(|entry| entry.id != id);
    }

    fn active_observers(&self) -> usize {
        self.observers()
            .iter()
            .filter(|entry| !entry.disconnected.load(Ordering::SeqCst))
            .count()
    }
}

/// A cloneable disconnector for one observer registration.
///
/// Abort paths, detach detection, and normal resolution may all race to
/// disconnect; the first call wins and the rest are no-ops.
#[derive(Clone)]
pub struct ObserverHandle {
    id: u64,
    doc: Weak<DocumentInner>,
    disconnected: Arc<AtomicBool>,
}

impl ObserverHandle {
    /// A handle backed by no registration; disconnecting it only sets the
    /// flag. Used before observation has begun and for orphaned targets.
    pub(crate) fn unregistered() -> Self {
        Self {
            id: 0,
            doc: Weak::new(),
            disconnected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Tear down the registration. Idempotent.
    pub fn disconnect(&self) {
        if !self.disconnected.swap(true, Ordering::SeqCst) {
            if let Some(doc) = self.doc.upgrade() {
                doc.unregister(self.id);
            }
        }
    }

    /// Whether [`disconnect`](Self::disconnect) has been called.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

/// An active mutation-observation registration.
///
/// Owns exactly one entry in the document's observer table. Batches are
/// consumed with [`next_batch`](Self::next_batch); the registration ends
/// via [`disconnect`](Self::disconnect) (or any clone of
/// [`handle`](Self::handle)) and is also torn down on drop.
pub struct MutationObserver {
    handle: ObserverHandle,
    rx: mpsc::UnboundedReceiver<Vec<MutationRecord>>,
}

impl MutationObserver {
    /// Register an observer on `target` with the given options.
    ///
    /// Observing a node whose document has been dropped yields an observer
    /// that never delivers a batch.
    pub fn observe(target: &Arc<Node>, options: ObserverOptions) -> Self {
        match target.document() {
            Some(doc) => doc.register(target, options),
            None => {
                // Orphaned node: synthesize a permanently-silent observer.
                let (_tx, rx) = mpsc::unbounded_channel();
                Self {
                    handle: ObserverHandle::unregistered(),
                    rx,
                }
            }
        }
    }

    /// The next batch of matching records, or `None` once disconnected.
    ///
    /// Batches queued before a disconnect are not delivered after it.
    pub async fn next_batch(&mut self) -> Option<Vec<MutationRecord>> {
        if self.handle.is_disconnected() {
            return None;
        }
        let batch = self.rx.recv().await?;
        if self.handle.is_disconnected() {
            return None;
        }
        Some(batch)
    }

    /// A cloneable disconnector for this registration.
    pub fn handle(&self) -> ObserverHandle {
        self.handle.clone()
    }

    /// Tear down the registration. Idempotent.
    pub fn disconnect(&self) {
        self.handle.disconnect();
    }
}

impl Drop for MutationObserver {
    fn drop(&mut self) {
        self.handle.disconnect();
    }
}

/// An in-memory document: a connected root element plus the observer
/// table.
pub struct Document {
    inner: Arc<DocumentInner>,
    root: Arc<Node>,
}

impl Document {
    /// Create a document with an empty, connected `body` root.
    pub fn new() -> Self {
        let inner = Arc::new(DocumentInner::default());
        let root = Node::new("body", true, &inner);
        Self { inner, root }
    }

    /// The always-connected root element.
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Create a detached element owned by this document.
    pub fn create_element(&self, tag: &str) -> Arc<Node> {
        Node::new(tag, false, &self.inner)
    }

    /// Number of live (not yet disconnected) observer registrations.
    ///
    /// Exposed for leak assertions in tests of code built on the waiting
    /// primitives.
    pub fn observer_count(&self) -> usize {
        self.inner.active_observers()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
