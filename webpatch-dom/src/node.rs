//! The element tree.
//!
//! Nodes are always handled as `Arc<Node>`; identity is pointer identity
//! ([`Node::same`]). A node is *connected* when its parent chain reaches
//! the document root. Structural and content mutations notify the owning
//! document's observers; see [`crate::document`].

use crate::document::{DocumentInner, MutationKind, MutationRecord};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

struct NodeState {
    attributes: HashMap<String, String>,
    text: String,
    children: Vec<Arc<Node>>,
    parent: Weak<Node>,
}

/// One element in the tree.
pub struct Node {
    tag: String,
    is_root: bool,
    doc: Weak<DocumentInner>,
    state: Mutex<NodeState>,
}

impl Node {
    pub(crate) fn new(tag: &str, is_root: bool, doc: &Arc<DocumentInner>) -> Arc<Self> {
        Arc::new(Self {
            tag: tag.to_string(),
            is_root,
            doc: Arc::downgrade(doc),
            state: Mutex::new(NodeState {
                attributes: HashMap::new(),
                text: String::new(),
                children: Vec::new(),
                parent: Weak::new(),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn document(&self) -> Option<Arc<DocumentInner>> {
        self.doc.upgrade()
    }

    fn notify(&self, kind: MutationKind, target: Arc<Node>) {
        if let Some(doc) = self.doc.upgrade() {
            doc.notify(&[MutationRecord { kind, target }]);
        }
    }

    /// Pointer identity of two nodes.
    pub fn same(a: &Arc<Node>, b: &Arc<Node>) -> bool {
        Arc::ptr_eq(a, b)
    }

    /// The element's tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// An attribute value, if set.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.state().attributes.get(name).cloned()
    }

    /// Set an attribute. Emits an attribute mutation.
    pub fn set_attribute(self: &Arc<Self>, name: &str, value: &str) {
        self.state()
            .attributes
            .insert(name.to_string(), value.to_string());
        self.notify(MutationKind::Attributes, Arc::clone(self));
    }

    /// Remove an attribute. Emits an attribute mutation if it was set.
    pub fn remove_attribute(self: &Arc<Self>, name: &str) {
        if self.state().attributes.remove(name).is_some() {
            self.notify(MutationKind::Attributes, Arc::clone(self));
        }
    }

    /// The element's own text content.
    pub fn text(&self) -> String {
        self.state().text.clone()
    }

    /// Replace the element's text content. Emits a character-data mutation.
    pub fn set_text(self: &Arc<Self>, text: &str) {
        self.state().text = text.to_string();
        self.notify(MutationKind::CharacterData, Arc::clone(self));
    }

    /// The parent element, if attached to one.
    pub fn parent(&self) -> Option<Arc<Node>> {
        self.state().parent.upgrade()
    }

    /// Snapshot of the current children.
    pub fn children(&self) -> Vec<Arc<Node>> {
        self.state().children.clone()
    }

    /// Whether the parent chain reaches the document root.
    pub fn is_connected(&self) -> bool {
        if self.is_root {
            return true;
        }
        let mut current = self.parent();
        while let Some(node) = current {
            if node.is_root {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Whether `node` is this element or one of its descendants.
    pub fn contains(self: &Arc<Self>, node: &Arc<Node>) -> bool {
        if Node::same(self, node) {
            return true;
        }
        let mut current = node.parent();
        while let Some(ancestor) = current {
            if Node::same(self, &ancestor) {
                return true;
            }
            current = ancestor.parent();
        }
        false
    }

    /// Append a child, detaching it from any previous parent first.
    /// Emits child-list mutations at the old parent (if any) and at this
    /// element.
    ///
    /// # Panics
    ///
    /// Panics when appending an element to its own descendant — the
    /// resulting cycle is a programming error, not a recoverable state.
    pub fn append_child(self: &Arc<Self>, child: &Arc<Node>) {
        assert!(
            !child.contains(self),
            "cannot append an ancestor to its descendant"
        );
        child.detach();
        {
            let mut state = self.state();
            state.children.push(Arc::clone(child));
        }
        child.state().parent = Arc::downgrade(self);
        self.notify(MutationKind::ChildList, Arc::clone(self));
    }

    /// Remove a direct child. Returns whether it was present. Emits a
    /// child-list mutation at this element when it was.
    pub fn remove_child(self: &Arc<Self>, child: &Arc<Node>) -> bool {
        let removed = {
            let mut state = self.state();
            let before = state.children.len();
            state.children.retain(|existing| !Node::same(existing, child));
            state.children.len() != before
        };
        if removed {
            child.state().parent = Weak::new();
            self.notify(MutationKind::ChildList, Arc::clone(self));
        }
        removed
    }

    /// Detach this element from its parent, if it has one.
    pub fn detach(self: &Arc<Self>) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Depth-first search over this element and its descendants.
    pub fn find<P>(self: &Arc<Self>, predicate: P) -> Option<Arc<Node>>
    where
        P: Fn(&Arc<Node>) -> bool,
    {
        fn walk<P: Fn(&Arc<Node>) -> bool>(node: &Arc<Node>, predicate: &P) -> Option<Arc<Node>> {
            if predicate(node) {
                return Some(Arc::clone(node));
            }
            for child in node.children() {
                if let Some(found) = walk(&child, predicate) {
                    return Some(found);
                }
            }
            None
        }
        walk(self, &predicate)
    }

    /// First descendant (or self) with the given `id` attribute.
    pub fn find_by_id(self: &Arc<Self>, id: &str) -> Option<Arc<Node>> {
        self.find(|node| node.attribute("id").as_deref() == Some(id))
    }

    /// First descendant (or self) with the given tag name.
    pub fn find_by_tag(self: &Arc<Self>, tag: &str) -> Option<Arc<Node>> {
        self.find(|node| node.tag() == tag)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("tag", &self.tag)
            .field("is_root", &self.is_root)
            .finish_non_exhaustive()
    }
}
