use std::sync::Arc;

use webpatch_dom::{Document, Node};

/// Yield repeatedly so spawned tasks get to register observers and
/// consume pending mutation batches. Everything in these tests runs on
/// the current-thread runtime, so a handful of yields is deterministic.
pub async fn drain() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// A detached `<div id="...">` ready to be appended somewhere.
pub fn div_with_id(doc: &Document, id: &str) -> Arc<Node> {
    let el = doc.create_element("div");
    el.set_attribute("id", id);
    el
}
