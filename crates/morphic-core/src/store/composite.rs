//! Ordered fallthrough over several stores

use super::MappingStore;
use crate::error::MappingResult;
use crate::mapping::{Mapping, MappingKind};
use morphic_reflect::TypeKey;
use std::fmt;
use std::sync::Arc;

/// Queries its children in order and returns the first mapping found
#[derive(Clone, Default)]
pub struct CompositeStore {
    stores: Vec<Arc<dyn MappingStore>>,
}

impl CompositeStore {
    /// Composite over `stores`, queried in the given order
    #[must_use]
    pub fn new(stores: Vec<Arc<dyn MappingStore>>) -> Self {
        Self { stores }
    }

    /// Append a store with the lowest priority
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MappingStore>) -> Self {
        self.stores.push(store);
        self
    }

    /// Number of child stores
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Check if there are no child stores
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl MappingStore for CompositeStore {
    fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>> {
        for store in &self.stores {
            if let Some(mapping) = store.resolve(source, target, kind)? {
                return Ok(Some(mapping));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for CompositeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeStore")
            .field("stores", &self.stores.len())
            .finish()
    }
}
