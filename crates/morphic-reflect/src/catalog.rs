//! Type catalog and reflection gateway
//!
//! Provides [`TypeCatalog`], the standard [`ReflectionGateway`].

use crate::collection::{
    BTreeSetAdapter, CollectionAdapter, CollectionFamily, HashSetAdapter, VecAdapter, VecDequeAdapter,
    BTREE_SET_FAMILY, HASH_SET_FAMILY, VEC_DEQUE_FAMILY, VEC_FAMILY,
};
use crate::descriptor::{BaseLink, TypeDescriptor};
use crate::enums::{EnumInfo, EnumRepr};
use crate::key::{TypeKey, Value};
use crate::member::{MemberFilter, MemberInfo};
use crate::primitive::builtin_descriptors;
use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

/// Capability interface the engine uses to inspect types
///
/// The engine depends only on this enumeration contract.
pub trait ReflectionGateway: Send + Sync {
    /// Descriptor for `key` (nullability ignored)
    fn descriptor(&self, key: TypeKey) -> Option<Arc<TypeDescriptor>>;

    /// Members of `key`, including members of embedded bases, that pass
    /// `filter`; own members first, in declaration order
    fn members(&self, key: TypeKey, filter: MemberFilter) -> Vec<MemberInfo>;

    /// Accessor path viewing a `from` value as its embedded base `to`
    fn view_path(&self, from: TypeKey, to: TypeKey) -> Option<ViewPath>;

    /// Collection family by name
    fn family(&self, name: &str) -> Option<CollectionFamily>;

    /// Concrete collection of `family` holding `element`, if registered
    fn collection_of(&self, family: &str, element: TypeKey) -> Option<Arc<TypeDescriptor>>;

    /// Whether `key` is registered
    fn contains(&self, key: TypeKey) -> bool {
        self.descriptor(key).is_some()
    }

    /// Deep copy a value of type `key`
    fn clone_value(&self, key: TypeKey, value: &dyn Any) -> Option<Value> {
        self.descriptor(key)?.clone_value(value)
    }
}

/// Chain of base links from an outer type to one of its embedded bases
#[derive(Debug, Clone, Default)]
pub struct ViewPath {
    links: Vec<BaseLink>,
}

impl ViewPath {
    /// Whether the path is the identity view
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.links.is_empty()
    }

    /// View `value` as the base type
    #[must_use]
    pub fn apply<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> {
        let mut current = value;
        for link in &self.links {
            current = link.view(current)?;
        }
        Some(current)
    }

    /// Mutably view `value` as the base type
    #[must_use]
    pub fn apply_mut<'a>(&self, value: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let mut current = value;
        for link in &self.links {
            current = link.view_mut(current)?;
        }
        Some(current)
    }
}

/// Registry of type descriptors
///
/// Populated once at startup, then shared read-only.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    types: HashMap<TypeId, Arc<TypeDescriptor>>,
    families: HashMap<&'static str, CollectionFamily>,
    collections: HashMap<(&'static str, TypeId), TypeKey>,
}

impl TypeCatalog {
    /// Catalog pre-seeded with primitives and the built-in collection families
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        for descriptor in builtin_descriptors() {
            catalog.register(descriptor);
        }
        for family in [VEC_FAMILY, VEC_DEQUE_FAMILY, HASH_SET_FAMILY, BTREE_SET_FAMILY] {
            catalog.register_family(family);
        }
        catalog
    }

    /// Catalog with nothing registered
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a descriptor; replaces any earlier one for the same type
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        let key = descriptor.key();
        if let Some(adapter) = descriptor.collection() {
            self.collections
                .insert((adapter.family().name, adapter.element().id()), key);
        }
        if self.types.insert(key.id(), Arc::new(descriptor)).is_some() {
            tracing::warn!(ty = %key, "type descriptor replaced");
        }
        self
    }

    /// Register a field-less enum
    pub fn register_enum<E: EnumRepr>(&mut self) -> &mut Self {
        self.register(
            TypeDescriptor::builder::<E>()
                .build()
                .with_enumeration(EnumInfo::of::<E>()),
        )
    }

    /// Register `Vec<E>`
    pub fn register_vec<E: Any + Clone + Send + Sync>(&mut self) -> &mut Self {
        self.register_collection::<Vec<E>>(VecAdapter::<E>::new())
    }

    /// Register `VecDeque<E>`
    pub fn register_vec_deque<E: Any + Clone + Send + Sync>(&mut self) -> &mut Self {
        self.register_collection::<VecDeque<E>>(VecDequeAdapter::<E>::new())
    }

    /// Register `HashSet<E>`
    pub fn register_hash_set<E: Any + Clone + Eq + Hash + Send + Sync>(&mut self) -> &mut Self {
        self.register_collection::<HashSet<E>>(HashSetAdapter::<E>::new())
    }

    /// Register `BTreeSet<E>`
    pub fn register_btree_set<E: Any + Clone + Ord + Send + Sync>(&mut self) -> &mut Self {
        self.register_collection::<BTreeSet<E>>(BTreeSetAdapter::<E>::new())
    }

    /// Register collection type `C` with a custom adapter
    pub fn register_collection<C>(&mut self, adapter: impl CollectionAdapter + 'static) -> &mut Self
    where
        C: Any + Clone + Send + Sync,
    {
        let family = adapter.family();
        if !self.families.contains_key(family.name) {
            self.register_family(family);
        }
        self.register(
            TypeDescriptor::builder::<C>()
                .build()
                .with_collection(Arc::new(adapter)),
        )
    }

    /// Register a collection family
    pub fn register_family(&mut self, family: CollectionFamily) -> &mut Self {
        self.families.insert(family.name, family);
        self
    }

    /// Number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn collect_members(
        &self,
        descriptor: &TypeDescriptor,
        seen_names: &mut HashSet<String>,
        seen_types: &mut HashSet<TypeId>,
        out: &mut Vec<MemberInfo>,
        rebase: &dyn Fn(&MemberInfo) -> MemberInfo,
    ) {
        if !seen_types.insert(descriptor.key().id()) {
            return;
        }
        for member in descriptor.own_members() {
            if seen_names.insert(member.name().to_string()) {
                out.push(rebase(member));
            }
        }
        for link in descriptor.bases() {
            let Some(base) = self.types.get(&link.key().id()) else {
                continue;
            };
            let (get, get_mut) = link.accessors();
            let nested = |m: &MemberInfo| rebase(&m.rebased(descriptor.key(), get, get_mut));
            self.collect_members(base, seen_names, seen_types, out, &nested);
        }
    }
}

impl ReflectionGateway for TypeCatalog {
    fn descriptor(&self, key: TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.types.get(&key.id()).cloned()
    }

    fn members(&self, key: TypeKey, filter: MemberFilter) -> Vec<MemberInfo> {
        let Some(descriptor) = self.types.get(&key.id()) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        self.collect_members(
            descriptor,
            &mut HashSet::new(),
            &mut HashSet::new(),
            &mut out,
            &|m| m.clone(),
        );
        out.retain(|m| filter.accepts(m));
        out
    }

    fn view_path(&self, from: TypeKey, to: TypeKey) -> Option<ViewPath> {
        fn walk(
            catalog: &TypeCatalog,
            current: TypeId,
            to: TypeId,
            visited: &mut HashSet<TypeId>,
            links: &mut Vec<BaseLink>,
        ) -> bool {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                return false;
            }
            let Some(descriptor) = catalog.types.get(&current) else {
                return false;
            };
            for link in descriptor.bases() {
                links.push(link.clone());
                if walk(catalog, link.key().id(), to, visited, links) {
                    return true;
                }
                links.pop();
            }
            false
        }

        let mut links = Vec::new();
        walk(self, from.id(), to.id(), &mut HashSet::new(), &mut links).then_some(ViewPath { links })
    }

    fn family(&self, name: &str) -> Option<CollectionFamily> {
        self.families.get(name).copied()
    }

    fn collection_of(&self, family: &str, element: TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.families
            .get_key_value(family)
            .and_then(|(name, _)| self.collections.get(&(*name, element.id())))
            .and_then(|key| self.types.get(&key.id()))
            .cloned()
    }

    fn contains(&self, key: TypeKey) -> bool {
        self.types.contains_key(&key.id())
    }

    fn clone_value(&self, key: TypeKey, value: &dyn Any) -> Option<Value> {
        self.types.get(&key.id())?.clone_value(value)
    }
}
