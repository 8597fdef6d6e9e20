//! Store for enum, primitive and same-type conversions

use super::MappingStore;
use crate::convert::ConversionTable;
use crate::error::{MappingError, MappingResult};
use crate::mapping::{Mapping, MappingKind, Merge, Transform};
use morphic_reflect::{ReflectionGateway, TypeKey};
use std::fmt;
use std::sync::Arc;

/// Serves conversions the [`ConversionTable`] supports
///
/// Same-type pairs are deep copies. Merges always replace the target. A null
/// source yields null only when the requested target key is nullable; the
/// engine strips nullability before resolving, so that case is reached only
/// when the store is queried directly.
pub struct ConversionStore {
    gateway: Arc<dyn ReflectionGateway>,
    table: Arc<ConversionTable>,
}

impl ConversionStore {
    /// Store over `table`
    #[must_use]
    pub fn new(gateway: Arc<dyn ReflectionGateway>, table: Arc<ConversionTable>) -> Self {
        Self { gateway, table }
    }

    fn transform(&self, from: TypeKey, to: TypeKey) -> Transform {
        let gateway = Arc::clone(&self.gateway);
        let table = Arc::clone(&self.table);
        Transform::new(from, to, move |source, _ctx| match source {
            None if to.is_nullable() => Ok(None),
            None => Err(MappingError::NullMapping { from, to }),
            Some(value) => table.convert(&*gateway, value, from, to).map(Some),
        })
    }
}

impl MappingStore for ConversionStore {
    fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>> {
        if !self.table.supports(&*self.gateway, source, target) {
            return Ok(None);
        }
        let transform = self.transform(source, target);
        Ok(Some(match kind {
            MappingKind::Transform => transform.into(),
            MappingKind::Merge => Merge::replacing(Arc::new(transform)).into(),
        }))
    }
}

impl fmt::Debug for ConversionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
