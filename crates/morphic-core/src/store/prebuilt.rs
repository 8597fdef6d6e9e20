//! Store over hand-built mappings

use super::MappingStore;
use crate::error::MappingResult;
use crate::mapping::{Mapping, MappingKind};
use morphic_reflect::TypeKey;
use parking_lot::RwLock;

/// Linear list of prebuilt mappings
///
/// Later additions shadow earlier ones for the same pair and kind.
#[derive(Debug, Default)]
pub struct MappingCollectionStore {
    mappings: RwLock<Vec<Mapping>>,
}

impl MappingCollectionStore {
    /// Create new empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping
    pub fn add(&self, mapping: Mapping) {
        tracing::debug!(
            source = %mapping.source(),
            target = %mapping.target(),
            kind = %mapping.kind(),
            "prebuilt mapping added"
        );
        self.mappings.write().push(mapping);
    }

    /// Whether any mapping exists for the pair
    #[must_use]
    pub fn contains(&self, source: TypeKey, target: TypeKey) -> bool {
        self.mappings
            .read()
            .iter()
            .any(|m| m.source().same_type(&source) && m.target().same_type(&target))
    }

    /// Number of mappings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.read().len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.read().is_empty()
    }
}

impl MappingStore for MappingCollectionStore {
    fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>> {
        Ok(self
            .mappings
            .read()
            .iter()
            .rev()
            .find(|m| m.kind() == kind && m.source().same_type(&source) && m.target().same_type(&target))
            .cloned())
    }
}
