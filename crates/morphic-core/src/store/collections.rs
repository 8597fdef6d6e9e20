//! Store for collection-to-collection mappings

use super::MappingStore;
use crate::collections::Reconciler;
use crate::compiler::MappingProbe;
use crate::error::MappingResult;
use crate::mapping::{Mapping, MappingKind, Merge, Transform};
use morphic_reflect::{ReflectionGateway, TypeKey};
use std::fmt;
use std::sync::Arc;

/// Serves mappings between two registered collection types whose element
/// types are mappable
pub struct CollectionStore {
    gateway: Arc<dyn ReflectionGateway>,
    probe: MappingProbe,
}

impl CollectionStore {
    pub(crate) fn new(gateway: Arc<dyn ReflectionGateway>, probe: MappingProbe) -> Self {
        Self { gateway, probe }
    }
}

impl MappingStore for CollectionStore {
    fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>> {
        let (Some(fd), Some(td)) = (self.gateway.descriptor(source), self.gateway.descriptor(target)) else {
            return Ok(None);
        };
        let (Some(from), Some(to)) = (fd.collection(), td.collection()) else {
            return Ok(None);
        };
        if !self.probe.can_map(from.element(), to.element()) {
            return Ok(None);
        }

        let reference_elements = self
            .gateway
            .descriptor(to.element())
            .is_some_and(|d| d.is_reference());
        let reconciler = Arc::new(Reconciler::new(
            source,
            target,
            Arc::clone(from),
            Arc::clone(to),
            reference_elements,
        ));
        tracing::trace!(source = %source, target = %target, kind = %kind, "collection mapping built");

        Ok(Some(match kind {
            MappingKind::Transform => {
                Transform::new(source, target, move |source, ctx| reconciler.transform(source, ctx)).into()
            }
            MappingKind::Merge => {
                Merge::new(source, target, move |source, target, ctx| reconciler.merge(source, target, ctx)).into()
            }
        }))
    }
}

impl fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionStore")
            .field("probe", &self.probe)
            .finish_non_exhaustive()
    }
}
