//! Compile-time mappability check
//!
//! Answers "could the engine map `from` to `to`?" without compiling
//! anything, so automatic matching never has to re-enter a store.

use crate::convert::ConversionTable;
use crate::definition::DefinitionRegistry;
use crate::store::MappingCollectionStore;
use morphic_reflect::{ReflectionGateway, TypeKey};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct MappingProbe {
    gateway: Arc<dyn ReflectionGateway>,
    registry: Arc<DefinitionRegistry>,
    conversions: Arc<ConversionTable>,
    prebuilt: Arc<MappingCollectionStore>,
}

impl MappingProbe {
    pub(crate) fn new(
        gateway: Arc<dyn ReflectionGateway>,
        registry: Arc<DefinitionRegistry>,
        conversions: Arc<ConversionTable>,
        prebuilt: Arc<MappingCollectionStore>,
    ) -> Self {
        Self {
            gateway,
            registry,
            conversions,
            prebuilt,
        }
    }

    pub(crate) fn can_map(&self, from: TypeKey, to: TypeKey) -> bool {
        let (from, to) = (from.non_nullable(), to.non_nullable());
        if self.prebuilt.contains(from, to)
            || self.registry.contains(from, to)
            || self.conversions.supports(&*self.gateway, from, to)
        {
            return true;
        }

        let (Some(fd), Some(td)) = (self.gateway.descriptor(from), self.gateway.descriptor(to)) else {
            return false;
        };
        match (fd.collection(), td.collection()) {
            (Some(fa), Some(ta)) => self.can_map(fa.element(), ta.element()),
            _ => false,
        }
    }
}

impl fmt::Debug for MappingProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingProbe")
            .field("definitions", &self.registry.len())
            .field("prebuilt", &self.prebuilt.len())
            .finish_non_exhaustive()
    }
}
