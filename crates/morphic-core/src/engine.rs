//! Engine facade
//!
//! Provides [`EngineBuilder`] to register definitions and collaborators,
//! and [`Engine`], the thread-safe entry point for transforms and merges.

use crate::collections::{CollectionTypeResolver, TargetFinderRegistry};
use crate::compiler::{MappingCompiler, MappingProbe};
use crate::config::EngineConfig;
use crate::context::MappingContext;
use crate::convert::{ConversionTable, EnumMap};
use crate::definition::{Definition, DefinitionRegistry};
use crate::error::{MappingError, MappingResult};
use crate::mapping::{Mapping, MappingKind, Merge, MergeResult, PostMergeAction, Transform};
use crate::store::{
    CacheStats, CachingStore, CollectionStore, CompositeStore, ConversionStore, DefinitionStore, MappingCollectionStore,
    MappingStore,
};
use morphic_reflect::{CollectionKind, InstanceRegistry, ReflectionGateway, TypeDescriptor, TypeKey, Value};
use std::any::Any;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Fluent engine configuration
///
/// ```rust
/// use morphic_core::{DefinitionBuilder, EngineBuilder, IdenticalNameStrategy};
/// use morphic_reflect::{TypeCatalog, TypeDescriptor};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct User { id: u32 }
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct UserDto { id: u64 }
///
/// let mut catalog = TypeCatalog::new();
/// catalog
///     .register(
///         TypeDescriptor::builder::<User>()
///             .field("id", |u: &User| &u.id, |u: &mut User| &mut u.id)
///             .build(),
///     )
///     .register(
///         TypeDescriptor::builder::<UserDto>()
///             .constructor(UserDto::default)
///             .field("id", |u: &UserDto| &u.id, |u: &mut UserDto| &mut u.id)
///             .build(),
///     );
///
/// let engine = EngineBuilder::new(catalog)
///     .definition(DefinitionBuilder::<User, UserDto>::new().auto(IdenticalNameStrategy::new()).build())
///     .build()
///     .unwrap();
/// let dto: UserDto = engine.transform(&User { id: 3 }).unwrap();
/// assert_eq!(dto, UserDto { id: 3 });
/// ```
pub struct EngineBuilder {
    gateway: Arc<dyn ReflectionGateway>,
    registry: DefinitionRegistry,
    config: EngineConfig,
    prebuilt: Arc<MappingCollectionStore>,
    conversions: ConversionTable,
    finders: Arc<TargetFinderRegistry>,
    collection_types: Vec<(CollectionKind, String)>,
    services: InstanceRegistry,
}

impl EngineBuilder {
    /// Builder over `gateway`
    #[must_use]
    pub fn new(gateway: impl ReflectionGateway + 'static) -> Self {
        Self::with_gateway(Arc::new(gateway))
    }

    /// Builder over a shared gateway
    #[must_use]
    pub fn with_gateway(gateway: Arc<dyn ReflectionGateway>) -> Self {
        Self {
            gateway,
            registry: DefinitionRegistry::new(),
            config: EngineConfig::default(),
            prebuilt: Arc::new(MappingCollectionStore::new()),
            conversions: ConversionTable::new(),
            finders: Arc::new(TargetFinderRegistry::new()),
            collection_types: Vec::new(),
            services: InstanceRegistry::new(),
        }
    }

    /// Register a definition
    #[must_use]
    pub fn definition(mut self, definition: Definition) -> Self {
        self.registry.register(definition);
        self
    }

    /// Register several definitions in order
    #[must_use]
    pub fn definitions(mut self, definitions: impl IntoIterator<Item = Definition>) -> Self {
        for definition in definitions {
            self.registry.register(definition);
        }
        self
    }

    /// Replace the configuration
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a prebuilt mapping; prebuilt mappings take priority over everything else
    #[must_use]
    pub fn mapping(self, mapping: impl Into<Mapping>) -> Self {
        self.prebuilt.add(mapping.into());
        self
    }

    /// Register an explicit value map
    #[must_use]
    pub fn conversion_map<S, T>(mut self, map: EnumMap<S, T>) -> Self
    where
        S: Any + PartialEq + Send + Sync,
        T: Any + Clone + Send + Sync,
    {
        self.conversions.register(map);
        self
    }

    /// Match `S` elements to existing `T` elements by key during collection merges
    #[must_use]
    pub fn target_finder<S, T, K>(
        self,
        source_key: impl Fn(&S) -> K + Send + Sync + 'static,
        target_key: impl Fn(&T) -> K + Send + Sync + 'static,
    ) -> Self
    where
        S: Any,
        T: Any,
        K: Eq + Hash + Send + 'static,
    {
        self.finders.register_keyed(source_key, target_key);
        self
    }

    /// Bind an abstract collection interface to a concrete family
    ///
    /// Validated by [`build`](Self::build).
    #[must_use]
    pub fn collection_type(mut self, kind: CollectionKind, family: impl Into<String>) -> Self {
        self.collection_types.push((kind, family.into()));
        self
    }

    /// Register an auxiliary service visible to mapping routines
    #[must_use]
    pub fn service<T: Any + Send + Sync>(self, service: Arc<T>) -> Self {
        self.services.register(service);
        self
    }

    /// Assemble the engine
    ///
    /// # Errors
    /// [`MappingError::Registration`] for an invalid collection binding
    pub fn build(self) -> MappingResult<Engine> {
        let collection_types = Arc::new(CollectionTypeResolver::new());
        for (kind, family) in &self.collection_types {
            collection_types.register(*kind, family, &*self.gateway)?;
        }
        self.services.register(Arc::clone(&self.finders));
        self.services.register(Arc::clone(&collection_types));

        let registry = Arc::new(self.registry);
        let conversions = Arc::new(self.conversions);
        let config = Arc::new(self.config);
        let probe = MappingProbe::new(
            Arc::clone(&self.gateway),
            Arc::clone(&registry),
            Arc::clone(&conversions),
            Arc::clone(&self.prebuilt),
        );
        let compiler = MappingCompiler::new(
            Arc::clone(&self.gateway),
            Arc::clone(&registry),
            Arc::clone(&config),
            Arc::clone(&conversions),
            Arc::clone(&self.prebuilt),
        );

        let composite = CompositeStore::new(vec![
            self.prebuilt as Arc<dyn MappingStore>,
            Arc::new(DefinitionStore::new(compiler)),
            Arc::new(ConversionStore::new(Arc::clone(&self.gateway), conversions)),
            Arc::new(CollectionStore::new(Arc::clone(&self.gateway), probe)),
        ]);
        let store = CachingStore::new(composite).with_negative_caching(config.cache_negative_lookups);

        tracing::info!(
            definitions = registry.len(),
            identity_tracking = config.identity_tracking,
            max_depth = config.max_depth,
            "mapping engine built"
        );
        Ok(Engine {
            gateway: self.gateway,
            store: Arc::new(store),
            services: Arc::new(self.services),
            config,
            collection_types,
        })
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("definitions", &self.registry.len())
            .field("prebuilt", &self.prebuilt.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Thread-safe mapping engine
///
/// Each call gets its own [`MappingContext`]; compiled mappings are cached
/// and shared across threads.
#[derive(Clone)]
pub struct Engine {
    gateway: Arc<dyn ReflectionGateway>,
    store: Arc<CachingStore>,
    services: Arc<InstanceRegistry>,
    config: Arc<EngineConfig>,
    collection_types: Arc<CollectionTypeResolver>,
}

impl Engine {
    /// Start configuring an engine over `gateway`
    #[must_use]
    pub fn builder(gateway: impl ReflectionGateway + 'static) -> EngineBuilder {
        EngineBuilder::new(gateway)
    }

    /// Fresh per-call context
    #[must_use]
    pub fn context(&self) -> MappingContext<'_> {
        MappingContext::new(&*self.store, &*self.gateway, &self.services, &self.config)
    }

    /// Resolve (and cache) the mapping for a pair
    ///
    /// # Errors
    /// Compilation failures for the pair
    pub fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>> {
        self.store.resolve(source, target, kind)
    }

    /// Compiled transform for a pair
    ///
    /// # Errors
    /// [`MappingError::Unsupported`] when nothing maps the pair
    pub fn transformer(&self, source: TypeKey, target: TypeKey) -> MappingResult<Arc<Transform>> {
        self.context().transformer(source, target)
    }

    /// Compiled merge for a pair
    ///
    /// # Errors
    /// [`MappingError::Unsupported`] when nothing maps the pair
    pub fn merger(&self, source: TypeKey, target: TypeKey) -> MappingResult<Arc<Merge>> {
        self.context().merger(source, target)
    }

    /// Transform `source` into a new `T`
    ///
    /// # Errors
    /// [`MappingError::NullResult`] if the mapping produced null, plus
    /// anything the mapping reports
    pub fn transform<S: Any, T: Any>(&self, source: &S) -> MappingResult<T> {
        let (from, to) = (TypeKey::of::<S>(), TypeKey::of::<T>());
        let value = self
            .transform_dyn(Some(source), from, to)?
            .ok_or(MappingError::NullResult { from, to })?;
        downcast(value)
    }

    /// Transform a possibly-null source into a possibly-null `T`
    ///
    /// # Errors
    /// Anything the mapping reports
    pub fn transform_option<S: Any, T: Any>(&self, source: Option<&S>) -> MappingResult<Option<T>> {
        let source = source.map(|s| s as &dyn Any);
        self.transform_dyn(source, TypeKey::of::<S>(), TypeKey::of::<T>().nullable())?
            .map(downcast)
            .transpose()
    }

    /// Type-erased transform
    ///
    /// # Errors
    /// Anything the mapping reports
    pub fn transform_dyn(&self, source: Option<&dyn Any>, from: TypeKey, to: TypeKey) -> MappingResult<Option<Value>> {
        self.context().transform(source, from, to)
    }

    /// Merge `source` into `target`
    ///
    /// When the mapping asks for replacement, `target` is overwritten with
    /// the replacement value.
    ///
    /// # Errors
    /// [`MappingError::NullResult`] if the replacement is null, plus anything
    /// the mapping reports
    pub fn merge<S: Any, T: Any>(&self, source: &S, target: &mut T) -> MappingResult<PostMergeAction> {
        let (from, to) = (TypeKey::of::<S>(), TypeKey::of::<T>());
        let result = self.merge_dyn(Some(source), Some(&mut *target), from, to)?;
        let action = result.action();
        if result.is_replace() {
            let replacement = result.into_replacement().ok_or(MappingError::NullResult { from, to })?;
            *target = downcast(replacement)?;
        }
        Ok(action)
    }

    /// Type-erased merge
    ///
    /// # Errors
    /// Anything the mapping reports
    pub fn merge_dyn(
        &self,
        source: Option<&dyn Any>,
        target: Option<&mut dyn Any>,
        from: TypeKey,
        to: TypeKey,
    ) -> MappingResult<MergeResult> {
        self.context().merge(source, target, from, to)
    }

    /// Concrete collection type registered for an abstract interface
    ///
    /// # Errors
    /// [`MappingError::UnregisteredCollection`] when no instantiation exists
    pub fn collection_type(&self, kind: CollectionKind, element: TypeKey) -> MappingResult<Arc<TypeDescriptor>> {
        self.collection_types.resolve(kind, element, &*self.gateway)
    }

    /// Transform a collection into whichever concrete collection is bound to `kind`
    ///
    /// # Errors
    /// Unregistered collection types, plus anything the mapping reports
    pub fn transform_into<S: Any>(
        &self,
        source: &S,
        kind: CollectionKind,
        element: TypeKey,
    ) -> MappingResult<Option<Value>> {
        let target = self.collection_type(kind, element)?;
        self.transform_dyn(Some(source), TypeKey::of::<S>(), target.key())
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reflection gateway
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &dyn ReflectionGateway {
        &*self.gateway
    }

    /// Auxiliary services
    #[inline]
    #[must_use]
    pub fn services(&self) -> &InstanceRegistry {
        &self.services
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn downcast<T: Any>(value: Value) -> MappingResult<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| MappingError::type_mismatch::<T>())
}
