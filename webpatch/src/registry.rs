//! The patch registry.

use crate::patch::{Patch, discovered_patches};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Registry construction errors. Fail-fast misuse: two patches sharing an
/// id would corrupt the once-per-session bookkeeping.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Two registered patches share an id.
    #[error("duplicate patch id \"{id}\"")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },
}

/// An immutable collection of patches, iterated in registration order.
///
/// Registration order is how patches are *launched* within a dispatch
/// pass; it carries no completion-order guarantee and must not be relied
/// on for correctness.
#[derive(Debug)]
pub struct PatchRegistry {
    patches: Vec<Arc<Patch>>,
}

impl PatchRegistry {
    /// Collect every patch submitted via `inventory::submit!`.
    pub fn discovered() -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::new();
        for patch in discovered_patches() {
            builder = builder.register(patch);
        }
        builder.build()
    }

    /// Iterate patches in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Patch>> {
        self.patches.iter()
    }

    /// Number of registered patches.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

/// Builder for constructing a [`PatchRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    patches: Vec<Arc<Patch>>,
}

impl RegistryBuilder {
    /// Create a new empty registry builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a patch.
    pub fn register(mut self, patch: Patch) -> Self {
        self.patches.push(Arc::new(patch));
        self
    }

    /// Validate and build the registry.
    pub fn build(self) -> Result<PatchRegistry, RegistryError> {
        let mut seen = HashSet::new();
        for patch in &self.patches {
            if !seen.insert(patch.meta.id.clone()) {
                return Err(RegistryError::DuplicateId {
                    id: patch.meta.id.clone(),
                });
            }
        }
        Ok(PatchRegistry {
            patches: self.patches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Patch;
    use webpatch_core::{PatchMeta, UrlPattern};

    fn patch(id: &str) -> Patch {
        let meta = PatchMeta::builder(id, id)
            .match_url(UrlPattern::new(".*").unwrap())
            .build()
            .unwrap();
        Patch::new(meta, |_ctx| async { Ok(()) })
    }

    #[test]
    fn preserves_registration_order() {
        let registry = RegistryBuilder::new()
            .register(patch("a"))
            .register(patch("b"))
            .build()
            .unwrap();
        let ids: Vec<_> = registry.iter().map(|p| p.meta.id.clone()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = RegistryBuilder::new()
            .register(patch("a"))
            .register(patch("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { .. }));
    }
}
