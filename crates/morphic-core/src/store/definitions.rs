//! Store that compiles registered definitions

use super::MappingStore;
use crate::compiler::MappingCompiler;
use crate::error::MappingResult;
use crate::mapping::{Mapping, MappingKind};
use morphic_reflect::TypeKey;
use std::fmt;

/// Looks up the most recently registered definition for a pair and compiles it
///
/// Compiles on every call; put a [`CachingStore`](super::CachingStore) in
/// front to compile each pair once.
pub struct DefinitionStore {
    compiler: MappingCompiler,
}

impl DefinitionStore {
    /// Store compiling through `compiler`
    #[must_use]
    pub fn new(compiler: MappingCompiler) -> Self {
        Self { compiler }
    }

    /// Underlying compiler
    #[inline]
    #[must_use]
    pub fn compiler(&self) -> &MappingCompiler {
        &self.compiler
    }
}

impl MappingStore for DefinitionStore {
    fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>> {
        let Some(definition) = self.compiler.registry().find(source, target) else {
            return Ok(None);
        };
        self.compiler.compile(&definition, kind).map(Some)
    }
}

impl fmt::Debug for DefinitionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionStore")
            .field("compiler", &self.compiler)
            .finish()
    }
}
