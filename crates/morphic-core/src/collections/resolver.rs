//! Abstract collection interface to concrete collection type

use crate::error::{MappingError, MappingResult, RegistrationError};
use morphic_reflect::{CollectionKind, ReflectionGateway, TypeDescriptor, TypeKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Chooses the concrete collection family to instantiate for an abstract
/// collection request
///
/// Defaults: sequences, collections and lists become `Vec`, sets become
/// `HashSet`. Bindings are validated when registered.
#[derive(Debug)]
pub struct CollectionTypeResolver {
    bindings: RwLock<HashMap<CollectionKind, &'static str>>,
}

impl CollectionTypeResolver {
    /// Resolver with the default bindings
    #[must_use]
    pub fn new() -> Self {
        let bindings = HashMap::from([
            (CollectionKind::Sequence, "Vec"),
            (CollectionKind::Collection, "Vec"),
            (CollectionKind::List, "Vec"),
            (CollectionKind::Set, "HashSet"),
        ]);
        Self {
            bindings: RwLock::new(bindings),
        }
    }

    /// Bind `kind` to `family`
    ///
    /// # Errors
    /// The family is unknown, abstract, does not implement `kind`, or is not
    /// generic over exactly one element type
    pub fn register(
        &self,
        kind: CollectionKind,
        family: &str,
        gateway: &dyn ReflectionGateway,
    ) -> Result<(), RegistrationError> {
        let resolved = gateway
            .family(family)
            .ok_or_else(|| RegistrationError::UnknownFamily(family.to_string()))?;
        if resolved.is_abstract {
            return Err(RegistrationError::AbstractFamily(family.to_string()));
        }
        if !resolved.implements(kind) {
            return Err(RegistrationError::NotImplemented {
                family: family.to_string(),
                kind,
            });
        }
        if resolved.arity != 1 {
            return Err(RegistrationError::Arity {
                family: family.to_string(),
                arity: resolved.arity,
            });
        }
        tracing::debug!(kind = %kind, family = resolved.name, "collection type registered");
        self.bindings.write().insert(kind, resolved.name);
        Ok(())
    }

    /// Family currently bound to `kind`
    #[must_use]
    pub fn family_for(&self, kind: CollectionKind) -> Option<&'static str> {
        self.bindings.read().get(&kind).copied()
    }

    /// Concrete collection type for `kind` holding `element`
    ///
    /// # Errors
    /// [`MappingError::UnregisteredCollection`] if the bound family has no
    /// registered instantiation for `element`
    pub fn resolve(
        &self,
        kind: CollectionKind,
        element: TypeKey,
        gateway: &dyn ReflectionGateway,
    ) -> MappingResult<Arc<TypeDescriptor>> {
        self.family_for(kind)
            .and_then(|family| gateway.collection_of(family, element.non_nullable()))
            .ok_or(MappingError::UnregisteredCollection { kind, element })
    }
}

impl Default for CollectionTypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphic_reflect::{CollectionFamily, TypeCatalog};
    use std::collections::VecDeque;

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog
            .register_vec::<u32>()
            .register_vec_deque::<u32>()
            .register_hash_set::<u32>()
            .register_family(CollectionFamily {
                name: "AbstractList",
                implements: &[CollectionKind::List],
                is_abstract: true,
                arity: 1,
            })
            .register_family(CollectionFamily {
                name: "Table",
                implements: &[CollectionKind::Collection],
                is_abstract: false,
                arity: 2,
            });
        catalog
    }

    #[test]
    fn defaults_pick_vec_and_hash_set() {
        let catalog = catalog();
        let resolver = CollectionTypeResolver::new();
        let list = resolver.resolve(CollectionKind::List, TypeKey::of::<u32>(), &catalog).unwrap();
        assert_eq!(list.key(), TypeKey::of::<Vec<u32>>());
        let set = resolver.resolve(CollectionKind::Set, TypeKey::of::<u32>(), &catalog).unwrap();
        assert_eq!(set.key(), TypeKey::of::<std::collections::HashSet<u32>>());
    }

    #[test]
    fn registration_overrides_default() {
        let catalog = catalog();
        let resolver = CollectionTypeResolver::new();
        resolver.register(CollectionKind::List, "VecDeque", &catalog).unwrap();
        let list = resolver.resolve(CollectionKind::List, TypeKey::of::<u32>(), &catalog).unwrap();
        assert_eq!(list.key(), TypeKey::of::<VecDeque<u32>>());
    }

    #[test]
    fn registration_is_validated() {
        let catalog = catalog();
        let resolver = CollectionTypeResolver::new();
        assert_eq!(
            resolver.register(CollectionKind::List, "Nope", &catalog),
            Err(RegistrationError::UnknownFamily("Nope".to_string()))
        );
        assert_eq!(
            resolver.register(CollectionKind::List, "AbstractList", &catalog),
            Err(RegistrationError::AbstractFamily("AbstractList".to_string()))
        );
        assert!(matches!(
            resolver.register(CollectionKind::Set, "Vec", &catalog),
            Err(RegistrationError::NotImplemented { .. })
        ));
        assert!(matches!(
            resolver.register(CollectionKind::Collection, "Table", &catalog),
            Err(RegistrationError::Arity { arity: 2, .. })
        ));
        assert_eq!(resolver.family_for(CollectionKind::List), Some("Vec"));
    }

    #[test]
    fn missing_instantiation_is_reported() {
        let catalog = catalog();
        let resolver = CollectionTypeResolver::new();
        let err = resolver
            .resolve(CollectionKind::List, TypeKey::of::<String>(), &catalog)
            .unwrap_err();
        assert_eq!(
            err,
            MappingError::UnregisteredCollection {
                kind: CollectionKind::List,
                element: TypeKey::of::<String>(),
            }
        );
    }
}
