//! Fluent element construction.
//!
//! `ElementBuilder` builds a new element — or restyles an existing one —
//! in a single chain, including a conditional `when` / `else_when` /
//! `otherwise` branch facility so patch code can stay declarative.

use crate::document::Document;
use crate::node::Node;
use std::sync::Arc;

/// Fluent builder over one element.
///
/// # Example
///
/// ```rust,ignore
/// let badge = ElementBuilder::tag(&doc, "span")
///     .id("avg-badge")
///     .attr("class", "badge")
///     .when(score > 4.0, |b| b.attr("data-tone", "good"))
///     .otherwise(|b| b.attr("data-tone", "poor"))
///     .text("4.2")
///     .append_to(&container);
/// ```
pub struct ElementBuilder {
    node: Arc<Node>,
    last_condition_met: Option<bool>,
}

impl ElementBuilder {
    /// Start a new detached element in `document`.
    pub fn tag(document: &Document, tag: &str) -> Self {
        Self {
            node: document.create_element(tag),
            last_condition_met: None,
        }
    }

    /// Wrap an existing element, allowing fluent modification.
    pub fn from_node(node: Arc<Node>) -> Self {
        Self {
            node,
            last_condition_met: None,
        }
    }

    /// Set the `id` attribute.
    pub fn id(self, id: &str) -> Self {
        self.node.set_attribute("id", id);
        self
    }

    /// Set one attribute.
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.node.set_attribute(name, value);
        self
    }

    /// Remove one attribute.
    pub fn remove_attr(self, name: &str) -> Self {
        self.node.remove_attribute(name);
        self
    }

    /// Set the text content.
    pub fn text(self, text: &str) -> Self {
        self.node.set_text(text);
        self
    }

    /// Append a child element.
    pub fn child(self, child: &Arc<Node>) -> Self {
        self.node.append_child(child);
        self
    }

    /// Apply `configure` when `condition` holds, and start a conditional
    /// chain for [`else_when`](Self::else_when) / [`otherwise`](Self::otherwise).
    pub fn when(mut self, condition: bool, configure: impl FnOnce(Self) -> Self) -> Self {
        self.last_condition_met = Some(condition);
        if condition {
            let mut built = configure(self);
            built.last_condition_met = Some(true);
            built
        } else {
            self
        }
    }

    /// Apply `configure` when no earlier branch matched and `condition`
    /// holds.
    ///
    /// # Panics
    ///
    /// Panics when called before [`when`](Self::when) — a mis-sequenced
    /// chain is a programming error.
    pub fn else_when(mut self, condition: bool, configure: impl FnOnce(Self) -> Self) -> Self {
        let met = self
            .last_condition_met
            .expect("else_when() cannot be used before or without when()");
        if !met && condition {
            self.last_condition_met = Some(true);
            let mut built = configure(self);
            built.last_condition_met = Some(true);
            built
        } else {
            self
        }
    }

    /// Apply `configure` when no earlier branch matched.
    ///
    /// # Panics
    ///
    /// Panics when called before [`when`](Self::when).
    pub fn otherwise(self, configure: impl FnOnce(Self) -> Self) -> Self {
        let met = self
            .last_condition_met
            .expect("otherwise() cannot be used before or without when()");
        if !met { configure(self) } else { self }
    }

    /// Finish and return the element.
    pub fn build(self) -> Arc<Node> {
        self.node
    }

    /// Finish, append to `parent`, and return the element.
    pub fn append_to(self, parent: &Arc<Node>) -> Arc<Node> {
        parent.append_child(&self.node);
        self.node
    }
}
