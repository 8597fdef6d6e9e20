//! Definition registry

use crate::definition::Definition;
use morphic_reflect::TypeKey;
use std::sync::Arc;

/// Every known definition, in registration order
///
/// Populated at startup and read-only once handed to an engine.
#[derive(Debug, Default, Clone)]
pub struct DefinitionRegistry {
    definitions: Vec<Arc<Definition>>,
}

impl DefinitionRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition; later registrations shadow earlier ones
    pub fn register(&mut self, definition: Definition) -> &mut Self {
        tracing::debug!(
            source = %definition.source(),
            target = %definition.target(),
            fragments = definition.fragments().len(),
            "definition registered"
        );
        self.definitions.push(Arc::new(definition));
        self
    }

    /// Most recently registered definition for the pair
    #[must_use]
    pub fn find(&self, source: TypeKey, target: TypeKey) -> Option<Arc<Definition>> {
        self.iter_rev().find(|d| d.is_for(source, target)).cloned()
    }

    /// Whether a definition exists for the pair
    #[inline]
    #[must_use]
    pub fn contains(&self, source: TypeKey, target: TypeKey) -> bool {
        self.iter_rev().any(|d| d.is_for(source, target))
    }

    /// Definitions, most recently registered first
    pub fn iter_rev(&self) -> impl Iterator<Item = &Arc<Definition>> {
        self.definitions.iter().rev()
    }

    /// Number of registered definitions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Fragment, FragmentKind};

    fn definition_with(constructor: &str) -> Definition {
        let mut definition = Definition::new(TypeKey::of::<u8>(), TypeKey::of::<u16>());
        definition.push(Fragment::new(
            TypeKey::of::<u8>(),
            TypeKey::of::<u16>(),
            FragmentKind::Activate {
                constructor: Some(constructor.to_string()),
            },
        ));
        definition
    }

    #[test]
    fn last_registered_wins() {
        let mut registry = DefinitionRegistry::new();
        registry
            .register(definition_with("first"))
            .register(definition_with("second"));

        let found = registry
            .find(TypeKey::of::<u8>(), TypeKey::of::<u16>())
            .unwrap();
        let FragmentKind::Activate { constructor } = found.fragments()[0].kind() else {
            panic!("expected activation fragment");
        };
        assert_eq!(constructor.as_deref(), Some("second"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn missing_pair() {
        let registry = DefinitionRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.find(TypeKey::of::<u8>(), TypeKey::of::<u16>()).is_none());
        assert!(!registry.contains(TypeKey::of::<u8>(), TypeKey::of::<u16>()));
    }
}
