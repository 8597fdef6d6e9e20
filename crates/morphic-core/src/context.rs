//! Per-call mapping state
//!
//! A [`MappingContext`] is created for every top-level mapping call and
//! threaded through every nested transform and merge it triggers.

use crate::config::EngineConfig;
use crate::error::{MappingError, MappingResult};
use crate::mapping::{Mapping, MappingKind, Merge, MergeResult, Transform};
use crate::store::MappingStore;
use morphic_reflect::{InstanceRegistry, ReflectError, ReflectionGateway, TypeKey, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct IdentityKey {
    address: usize,
    source: TypeId,
    target: TypeKey,
}

impl IdentityKey {
    fn new(source: &dyn Any, target: TypeKey) -> Self {
        Self {
            address: (source as *const dyn Any).cast::<()>() as usize,
            source: source.type_id(),
            target: target.non_nullable(),
        }
    }
}

enum Identity {
    InProgress,
    Done(Value),
}

/// Mutable state of one top-level mapping call
///
/// With `identity_tracking` on, a reference-type source reached twice during
/// one call is mapped once: the second visit gets a clone of the first
/// result, not a shared instance. A source reached again while it is still
/// being mapped (a cyclic graph) fails with [`MappingError::CyclicGraph`];
/// cycles are reported, never rebuilt.
pub struct MappingContext<'e> {
    store: &'e dyn MappingStore,
    gateway: &'e dyn ReflectionGateway,
    services: &'e InstanceRegistry,
    config: &'e EngineConfig,
    identities: HashMap<IdentityKey, Identity>,
    depth: usize,
}

impl<'e> MappingContext<'e> {
    /// Fresh context resolving nested mappings through `store`
    #[must_use]
    pub fn new(
        store: &'e dyn MappingStore,
        gateway: &'e dyn ReflectionGateway,
        services: &'e InstanceRegistry,
        config: &'e EngineConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            services,
            config,
            identities: HashMap::new(),
            depth: 0,
        }
    }

    /// Reflection gateway
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &'e dyn ReflectionGateway {
        self.gateway
    }

    /// Auxiliary services
    #[inline]
    #[must_use]
    pub fn services(&self) -> &'e InstanceRegistry {
        self.services
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &'e EngineConfig {
        self.config
    }

    /// Current nesting depth
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Resolve the transform for a pair
    ///
    /// # Errors
    /// [`MappingError::Unsupported`] if the store has none
    pub fn transformer(&self, from: TypeKey, to: TypeKey) -> MappingResult<Arc<Transform>> {
        match self.store.resolve(from, to, MappingKind::Transform)? {
            Some(Mapping::Transform(transform)) => Ok(transform),
            _ => Err(MappingError::unsupported(from, to, MappingKind::Transform)),
        }
    }

    /// Resolve the merge for a pair
    ///
    /// # Errors
    /// [`MappingError::Unsupported`] if the store has none
    pub fn merger(&self, from: TypeKey, to: TypeKey) -> MappingResult<Arc<Merge>> {
        match self.store.resolve(from, to, MappingKind::Merge)? {
            Some(Mapping::Merge(merge)) => Ok(merge),
            _ => Err(MappingError::unsupported(from, to, MappingKind::Merge)),
        }
    }

    /// Transform `source` (of type `from`) into a new `to`
    ///
    /// A null source into a nullable target short-circuits to null.
    ///
    /// # Errors
    /// Unsupported pairs and anything the resolved routine reports
    pub fn transform(&mut self, source: Option<&dyn Any>, from: TypeKey, to: TypeKey) -> MappingResult<Option<Value>> {
        if source.is_none() && to.is_nullable() {
            return Ok(None);
        }
        let transform = self.transformer(from.non_nullable(), to.non_nullable())?;
        self.run_transform(&transform, source)
    }

    /// Merge `source` into `target`
    ///
    /// # Errors
    /// Unsupported pairs and anything the resolved routine reports
    pub fn merge(
        &mut self,
        source: Option<&dyn Any>,
        target: Option<&mut dyn Any>,
        from: TypeKey,
        to: TypeKey,
    ) -> MappingResult<MergeResult> {
        if source.is_none() && to.is_nullable() {
            return Ok(MergeResult::replace(None));
        }
        let merge = self.merger(from.non_nullable(), to.non_nullable())?;
        self.run_merge(&merge, source, target)
    }

    /// Run an already resolved transform one level deeper
    ///
    /// # Errors
    /// [`MappingError::DepthExceeded`] past the configured limit, or
    /// whatever the routine reports
    pub fn run_transform(&mut self, transform: &Transform, source: Option<&dyn Any>) -> MappingResult<Option<Value>> {
        self.enter()?;
        let result = transform.apply(source, self);
        self.depth -= 1;
        result
    }

    /// Run an already resolved merge one level deeper
    ///
    /// # Errors
    /// [`MappingError::DepthExceeded`] past the configured limit, or
    /// whatever the routine reports
    pub fn run_merge(
        &mut self,
        merge: &Merge,
        source: Option<&dyn Any>,
        target: Option<&mut dyn Any>,
    ) -> MappingResult<MergeResult> {
        self.enter()?;
        let result = merge.apply(source, target, self);
        self.depth -= 1;
        result
    }

    /// Deep copy a value through the gateway
    ///
    /// # Errors
    /// Fails if `key` is not registered or `value` is not a `key`
    pub fn clone_value(&self, key: TypeKey, value: &dyn Any) -> MappingResult<Value> {
        self.gateway
            .clone_value(key, value)
            .ok_or_else(|| ReflectError::UnknownType(key.to_string()).into())
    }

    fn enter(&mut self) -> MappingResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(MappingError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn identity_lookup(&self, source: &dyn Any, from: TypeKey, to: TypeKey) -> MappingResult<Option<Value>> {
        match self.identities.get(&IdentityKey::new(source, to)) {
            None => Ok(None),
            Some(Identity::InProgress) => Err(MappingError::CyclicGraph { from, to }),
            Some(Identity::Done(target)) => {
                tracing::trace!(from = %from, to = %to, "identity cache hit");
                self.clone_value(to, &**target).map(Some)
            }
        }
    }

    pub(crate) fn identity_reserve(&mut self, source: &dyn Any, to: TypeKey) {
        self.identities
            .insert(IdentityKey::new(source, to), Identity::InProgress);
    }

    pub(crate) fn identity_complete(&mut self, source: &dyn Any, to: TypeKey, target: &dyn Any) {
        let key = IdentityKey::new(source, to);
        match self.gateway.clone_value(to, target) {
            Some(copy) => {
                self.identities.insert(key, Identity::Done(copy));
            }
            None => {
                self.identities.remove(&key);
            }
        }
    }
}

impl fmt::Debug for MappingContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingContext")
            .field("depth", &self.depth)
            .field("tracked_identities", &self.identities.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
