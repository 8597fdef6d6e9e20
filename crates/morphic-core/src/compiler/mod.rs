//! Definition compiler
//!
//! Provides [`MappingCompiler`], which turns a [`Definition`] into a
//! directly callable [`Transform`] or [`Merge`] by running an ordered task
//! pipeline over a scaffold and emitting a linear routine.
//!
//! Compilation never re-enters a store: nested mappings are resolved
//! lazily the first time a routine needs them.

mod ops;
mod probe;
mod scaffold;
mod tasks;

pub(crate) use probe::MappingProbe;

use crate::config::EngineConfig;
use crate::convert::ConversionTable;
use crate::definition::{Definition, DefinitionRegistry};
use crate::error::MappingResult;
use crate::mapping::{ConstructionStrategy, Mapping, MappingKind, Merge, Transform};
use crate::store::MappingCollectionStore;
use morphic_reflect::{ReflectionGateway, TypeKey};
use ops::{Frame, Routine};
use scaffold::Scaffold;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Compiles definitions into mappings
pub struct MappingCompiler {
    gateway: Arc<dyn ReflectionGateway>,
    registry: Arc<DefinitionRegistry>,
    config: Arc<EngineConfig>,
    probe: MappingProbe,
}

impl MappingCompiler {
    /// Compiler over the given collaborators
    ///
    /// `conversions` and `prebuilt` are only consulted to decide whether
    /// automatically matched members are mappable.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ReflectionGateway>,
        registry: Arc<DefinitionRegistry>,
        config: Arc<EngineConfig>,
        conversions: Arc<ConversionTable>,
        prebuilt: Arc<MappingCollectionStore>,
    ) -> Self {
        let probe = MappingProbe::new(Arc::clone(&gateway), Arc::clone(&registry), conversions, prebuilt);
        Self {
            gateway,
            registry,
            config,
            probe,
        }
    }

    /// Names of the tasks run for `kind`, in order
    #[must_use]
    pub fn pipeline(kind: MappingKind) -> Vec<&'static str> {
        tasks::pipeline(kind).iter().map(|t| t.name()).collect()
    }

    /// Reflection gateway
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &dyn ReflectionGateway {
        &*self.gateway
    }

    /// Definitions (used for inheritance lookup)
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn probe(&self) -> &MappingProbe {
        &self.probe
    }

    /// Whether `source` could be mapped to `target` by some store
    #[must_use]
    pub fn can_map(&self, source: TypeKey, target: TypeKey) -> bool {
        self.probe.can_map(source, target)
    }

    /// Compile `definition` into a mapping of `kind`
    ///
    /// A merge into a value-typed target always replaces the target with a
    /// fresh transform.
    ///
    /// # Errors
    /// Configuration defects: cyclic or incompatible inheritance, unknown
    /// members or constructors, no way to construct the target
    pub fn compile(&self, definition: &Arc<Definition>, kind: MappingKind) -> MappingResult<Mapping> {
        let started = Instant::now();
        let value_target = self
            .gateway
            .descriptor(definition.target())
            .is_some_and(|d| !d.is_reference());

        let mapping = match kind {
            MappingKind::Transform => Mapping::Transform(Arc::new(self.compile_transform(definition)?)),
            MappingKind::Merge if value_target => {
                let transform = Arc::new(self.compile_transform(definition)?);
                Mapping::Merge(Arc::new(Merge::replacing(transform)))
            }
            MappingKind::Merge => Mapping::Merge(Arc::new(self.compile_merge(definition)?)),
        };

        tracing::debug!(
            source = %definition.source(),
            target = %definition.target(),
            kind = %kind,
            strategy = ?mapping.strategy(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "definition compiled"
        );
        Ok(mapping)
    }

    fn build(&self, definition: &Arc<Definition>, kind: MappingKind) -> MappingResult<(Routine, Option<ConstructionStrategy>)> {
        let mut scaffold = Scaffold::new(self, Arc::clone(definition), kind);
        for task in tasks::pipeline(kind) {
            tracing::trace!(task = task.name(), "running compiler task");
            task.execute(&mut scaffold)?;
        }
        let (routine, strategy) = scaffold.finish();
        tracing::trace!(ops = routine.len(), "routine emitted");
        Ok((routine, strategy))
    }

    fn compile_transform(&self, definition: &Arc<Definition>) -> MappingResult<Transform> {
        let (routine, strategy) = self.build(definition, MappingKind::Transform)?;
        let routine = Arc::new(routine);
        let transform = Transform::new(definition.source(), definition.target(), move |source, ctx| {
            let mut frame = Frame::new(routine.source(), routine.target(), source, None);
            routine.run(&mut frame, ctx)?;
            Ok(frame.into_transform())
        });
        Ok(match strategy {
            Some(strategy) => transform.with_strategy(strategy),
            None => transform,
        })
    }

    fn compile_merge(&self, definition: &Arc<Definition>) -> MappingResult<Merge> {
        let (routine, strategy) = self.build(definition, MappingKind::Merge)?;
        let routine = Arc::new(routine);
        let merge = Merge::new(definition.source(), definition.target(), move |source, target, ctx| {
            let mut frame = Frame::new(routine.source(), routine.target(), source, target);
            routine.run(&mut frame, ctx)?;
            Ok(frame.into_merge())
        });
        Ok(match strategy {
            Some(strategy) => merge.with_strategy(strategy),
            None => merge,
        })
    }
}

impl fmt::Debug for MappingCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingCompiler")
            .field("definitions", &self.registry.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MappingContext;
    use crate::definition::{DefinitionBuilder, Shard};
    use crate::error::MappingError;
    use crate::matching::IdenticalNameStrategy;
    use crate::store::{CompositeStore, ConversionStore, MappingStore};
    use morphic_reflect::{InstanceRegistry, TypeCatalog, TypeDescriptor, Value};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Source {
        id: u32,
        name: String,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Target {
        id: u64,
        name: String,
        note: String,
    }

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(
                TypeDescriptor::builder::<Source>()
                    .constructor(Source::default)
                    .field("id", |s| &s.id, |s| &mut s.id)
                    .field("name", |s| &s.name, |s| &mut s.name)
                    .build(),
            )
            .register(
                TypeDescriptor::builder::<Target>()
                    .constructor(Target::default)
                    .field("id", |t| &t.id, |t| &mut t.id)
                    .field("name", |t| &t.name, |t| &mut t.name)
                    .field("note", |t| &t.note, |t| &mut t.note)
                    .build(),
            );
        catalog
    }

    struct Fixture {
        compiler: MappingCompiler,
        store: CompositeStore,
        catalog: Arc<TypeCatalog>,
        services: InstanceRegistry,
        config: EngineConfig,
    }

    impl Fixture {
        fn new(registry: DefinitionRegistry) -> Self {
            let catalog = Arc::new(catalog());
            let gateway: Arc<dyn ReflectionGateway> = catalog.clone();
            let conversions = Arc::new(ConversionTable::new());
            let compiler = MappingCompiler::new(
                Arc::clone(&gateway),
                Arc::new(registry),
                Arc::new(EngineConfig::new()),
                Arc::clone(&conversions),
                Arc::new(MappingCollectionStore::new()),
            );
            let store = CompositeStore::new(vec![Arc::new(ConversionStore::new(gateway, conversions))]);
            Self {
                compiler,
                store,
                catalog,
                services: InstanceRegistry::new(),
                config: EngineConfig::new(),
            }
        }

        fn transform(&self, definition: crate::definition::Definition, source: Option<&Source>) -> MappingResult<Option<Value>> {
            let mapping = self.compiler.compile(&Arc::new(definition), MappingKind::Transform)?;
            let transform = mapping.as_transform().cloned().unwrap();
            let mut ctx = MappingContext::new(&self.store as &dyn MappingStore, &*self.catalog, &self.services, &self.config);
            ctx.run_transform(&transform, source.map(|s| s as &dyn std::any::Any))
        }
    }

    fn source() -> Source {
        Source {
            id: 7,
            name: "seven".to_string(),
        }
    }

    #[test]
    fn auto_injection_converts_members() {
        let fixture = Fixture::new(DefinitionRegistry::new());
        let definition = DefinitionBuilder::<Source, Target>::new()
            .auto(IdenticalNameStrategy::new())
            .build();
        let out = fixture.transform(definition, Some(&source())).unwrap().unwrap();
        assert_eq!(
            out.downcast_ref::<Target>().unwrap(),
            &Target {
                id: 7,
                name: "seven".to_string(),
                note: String::new(),
            }
        );
    }

    #[test]
    fn explicit_member_beats_auto_and_ignore_suppresses() {
        let fixture = Fixture::new(DefinitionRegistry::new());
        let definition = DefinitionBuilder::<Source, Target>::new()
            .auto(IdenticalNameStrategy::new())
            .map("note", |s: &Source| format!("#{}", s.id))
            .ignore("name")
            .build();
        let out = fixture.transform(definition, Some(&source())).unwrap().unwrap();
        let target = out.downcast_ref::<Target>().unwrap();
        assert_eq!(target.note, "#7");
        assert_eq!(target.name, "");
        assert_eq!(target.id, 7);
    }

    #[test]
    fn last_value_shard_wins() {
        let fixture = Fixture::new(DefinitionRegistry::new());
        let definition = DefinitionBuilder::<Source, Target>::new()
            .member("note", vec![Shard::constant("a".to_string()), Shard::constant("b".to_string())])
            .build();
        let out = fixture.transform(definition, Some(&source())).unwrap().unwrap();
        assert_eq!(out.downcast_ref::<Target>().unwrap().note, "b");
    }

    #[test]
    fn conditions_gate_assignment() {
        let fixture = Fixture::new(DefinitionRegistry::new());
        let definition = DefinitionBuilder::<Source, Target>::new()
            .member("note", vec![Shard::when(|s: &Source| s.id > 10)])
            .member("note", vec![Shard::constant("big".to_string())])
            .build();
        let out = fixture.transform(definition, Some(&source())).unwrap().unwrap();
        assert_eq!(out.downcast_ref::<Target>().unwrap().note, "");
    }

    #[test]
    fn null_source_without_fragment_is_null() {
        let fixture = Fixture::new(DefinitionRegistry::new());
        let definition = DefinitionBuilder::<Source, Target>::new().build();
        assert!(fixture.transform(definition, None).unwrap().is_none());
    }

    #[test]
    fn null_source_default_produces_value() {
        let fixture = Fixture::new(DefinitionRegistry::new());
        let definition = DefinitionBuilder::<Source, Target>::new()
            .null_source_default()
            .build();
        let out = fixture.transform(definition, None).unwrap().unwrap();
        assert_eq!(out.downcast_ref::<Target>().unwrap(), &Target::default());
    }

    #[test]
    fn unknown_member_is_a_compile_error() {
        let fixture = Fixture::new(DefinitionRegistry::new());
        let definition = DefinitionBuilder::<Source, Target>::new()
            .map("missing", |_: &Source| 1u8)
            .build();
        let err = fixture.transform(definition, Some(&source())).unwrap_err();
        assert_eq!(
            err,
            MappingError::UnknownMember {
                ty: TypeKey::of::<Target>(),
                member: "missing".to_string(),
            }
        );
    }

    #[test]
    fn unknown_constructor_is_a_compile_error() {
        let fixture = Fixture::new(DefinitionRegistry::new());
        let definition = DefinitionBuilder::<Source, Target>::new()
            .activate_named("blank")
            .build();
        let err = fixture.transform(definition, Some(&source())).unwrap_err();
        assert!(matches!(err, MappingError::UnknownConstructor { .. }));
    }

    #[test]
    fn triggers_run_in_order() {
        let fixture = Fixture::new(DefinitionRegistry::new());
        let definition = DefinitionBuilder::<Source, Target>::new()
            .on_completed(|_, t, _| {
                t.note.push('c');
                Ok(())
            })
            .on_created(|_, t, _| {
                t.note.push('a');
                Ok(())
            })
            .map("note", |_: &Source| "b".to_string())
            .build();
        let out = fixture.transform(definition, Some(&source())).unwrap().unwrap();
        // the member assignment overwrites what the created trigger wrote
        assert_eq!(out.downcast_ref::<Target>().unwrap().note, "bc");
    }

    #[test]
    fn pipeline_names_are_public() {
        let names = MappingCompiler::pipeline(MappingKind::Merge);
        assert!(names.contains(&"auto_injection"));
    }
}
