//! Mapping resolution stores
//!
//! Provides the [`MappingStore`] abstraction and its implementations:
//! prebuilt mappings, definition compilation, conversions, collections,
//! fallthrough composition and memoization.

mod caching;
mod collections;
mod composite;
mod conversion;
mod definitions;
mod prebuilt;

pub use caching::{CacheStats, CachingStore};
pub use collections::CollectionStore;
pub use composite::CompositeStore;
pub use conversion::ConversionStore;
pub use definitions::DefinitionStore;
pub use prebuilt::MappingCollectionStore;

use crate::error::MappingResult;
use crate::mapping::{Mapping, MappingKind};
use morphic_reflect::TypeKey;
use std::sync::Arc;

/// Resolves the compiled mapping for a pair
///
/// `Ok(None)` means "not mine"; errors are configuration defects found
/// while building the mapping and stop resolution.
pub trait MappingStore: Send + Sync {
    /// Mapping of `kind` from `source` to `target`, if this store has one
    ///
    /// # Errors
    /// Compilation failures for the pair
    fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>>;
}

impl<S: MappingStore + ?Sized> MappingStore for Arc<S> {
    fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>> {
        (**self).resolve(source, target, kind)
    }
}

impl<S: MappingStore + ?Sized> MappingStore for Box<S> {
    fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>> {
        (**self).resolve(source, target, kind)
    }
}
