//! Typed definition authoring

use crate::context::MappingContext;
use crate::definition::fragment::{
    FactoryFn, Fragment, FragmentKind, NullFactoryFn, NullSourceBehavior, TriggerEvent, TriggerFn,
};
use crate::definition::shard::Shard;
use crate::definition::Definition;
use crate::error::{MappingError, MappingResult};
use crate::matching::MatchingStrategy;
use morphic_reflect::{TypeKey, Value};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

fn factory_fn<F>(f: F) -> FactoryFn
where
    F: Fn(&dyn Any, &mut MappingContext<'_>) -> MappingResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn null_factory_fn<F>(f: F) -> NullFactoryFn
where
    F: Fn(&mut MappingContext<'_>) -> MappingResult<Option<Value>> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn trigger_fn<F>(f: F) -> TriggerFn
where
    F: Fn(&dyn Any, &mut dyn Any, &mut MappingContext<'_>) -> MappingResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Fluent builder for a [`Definition`] of `S -> T`
///
/// Performs no validation beyond what the signatures enforce; compilation
/// reports malformed combinations.
///
/// ```rust
/// use morphic_core::{DefinitionBuilder, IdenticalNameStrategy, Shard};
///
/// struct Order { total: u32 }
/// #[derive(Default)]
/// struct OrderDto { total: u32, label: String }
///
/// let definition = DefinitionBuilder::<Order, OrderDto>::new()
///     .auto(IdenticalNameStrategy::new())
///     .member("label", vec![Shard::constant("order".to_string())])
///     .build();
/// assert_eq!(definition.fragments().len(), 2);
/// ```
pub struct DefinitionBuilder<S, T> {
    definition: Definition,
    next_inherited: Option<bool>,
    _marker: PhantomData<fn(&S) -> T>,
}

impl<S, T> DefinitionBuilder<S, T>
where
    S: Any,
    T: Any + Send + Sync,
{
    /// Start an empty definition
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: Definition::new(TypeKey::of::<S>(), TypeKey::of::<T>()),
            next_inherited: None,
            _marker: PhantomData,
        }
    }

    fn push(mut self, kind: FragmentKind) -> Self {
        let mut fragment = Fragment::new(TypeKey::of::<S>(), TypeKey::of::<T>(), kind);
        if let Some(inherited) = self.next_inherited.take() {
            fragment = fragment.with_inherited(inherited);
        }
        self.definition.push(fragment);
        self
    }

    /// Next fragment does not propagate to derived pairs
    #[must_use]
    pub fn not_inherited(mut self) -> Self {
        self.next_inherited = Some(false);
        self
    }

    /// Next fragment propagates to derived pairs
    #[must_use]
    pub fn inherited(mut self) -> Self {
        self.next_inherited = Some(true);
        self
    }

    /// Fold in the inherited fragments of `SB -> TB`
    #[must_use]
    pub fn inherits<SB: Any, TB: Any>(self) -> Self {
        self.push(FragmentKind::Inherits {
            source: TypeKey::of::<SB>(),
            target: TypeKey::of::<TB>(),
        })
    }

    /// Construct through the target's default constructor
    #[must_use]
    pub fn activate(self) -> Self {
        self.push(FragmentKind::Activate { constructor: None })
    }

    /// Construct through a named constructor of the target
    #[must_use]
    pub fn activate_named(self, constructor: impl Into<String>) -> Self {
        self.push(FragmentKind::Activate {
            constructor: Some(constructor.into()),
        })
    }

    /// Construct `T::default()`
    #[must_use]
    pub fn default_factory(self) -> Self
    where
        T: Default,
    {
        self.push(FragmentKind::DefaultFactory(Arc::new(|| Box::new(T::default()) as Value)))
    }

    /// Construct through `factory`
    #[must_use]
    pub fn custom_factory(
        self,
        factory: impl Fn(&S, &mut MappingContext<'_>) -> MappingResult<T> + Send + Sync + 'static,
    ) -> Self {
        self.push(FragmentKind::CustomFactory(factory_fn(move |source, ctx| {
            let source = source
                .downcast_ref::<S>()
                .ok_or_else(MappingError::type_mismatch::<S>)?;
            Ok(Box::new(factory(source, ctx)?) as Value)
        })))
    }

    /// A null source yields `T::default()`
    #[must_use]
    pub fn null_source_default(self) -> Self
    where
        T: Default,
    {
        self.push(FragmentKind::NullSource(NullSourceBehavior::Default(Arc::new(|| {
            Box::new(T::default()) as Value
        }))))
    }

    /// A null source yields whatever `factory` returns
    #[must_use]
    pub fn null_source_factory(
        self,
        factory: impl Fn(&mut MappingContext<'_>) -> MappingResult<Option<T>> + Send + Sync + 'static,
    ) -> Self {
        self.push(FragmentKind::NullSource(NullSourceBehavior::Factory(null_factory_fn(
            move |ctx| Ok(factory(ctx)?.map(|t| Box::new(t) as Value)),
        ))))
    }

    /// Configure target member `name`
    #[must_use]
    pub fn member(self, name: impl Into<String>, shards: Vec<Shard>) -> Self {
        self.push(FragmentKind::Member {
            name: name.into(),
            shards,
        })
    }

    /// Target member `name` takes the value of `f` over the source
    #[must_use]
    pub fn map<F>(self, name: impl Into<String>, f: impl Fn(&S) -> F + Send + Sync + 'static) -> Self
    where
        F: Any + Send + Sync,
    {
        self.member(name, vec![Shard::lambda(f)])
    }

    /// Target member `target` takes the mapped value of source member `source`
    #[must_use]
    pub fn map_from(self, target: impl Into<String>, source: impl Into<String>) -> Self {
        self.member(target, vec![Shard::from_member(source)])
    }

    /// Never inject target member `name`
    #[must_use]
    pub fn ignore(self, name: impl Into<String>) -> Self {
        self.member(name, vec![Shard::never()])
    }

    /// Match remaining members automatically
    #[must_use]
    pub fn auto(self, strategy: impl MatchingStrategy + 'static) -> Self {
        self.push(FragmentKind::AutoInjection(Arc::new(strategy)))
    }

    /// Run `action` on a lifecycle event
    #[must_use]
    pub fn trigger(
        self,
        event: TriggerEvent,
        action: impl Fn(&S, &mut T, &mut MappingContext<'_>) -> MappingResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.push(FragmentKind::Trigger {
            event,
            action: trigger_fn(move |source, target, ctx| {
                let source = source
                    .downcast_ref::<S>()
                    .ok_or_else(MappingError::type_mismatch::<S>)?;
                let target = target
                    .downcast_mut::<T>()
                    .ok_or_else(MappingError::type_mismatch::<T>)?;
                action(source, target, ctx)
            }),
        })
    }

    /// Run `action` right after the target is constructed
    #[must_use]
    pub fn on_created(
        self,
        action: impl Fn(&S, &mut T, &mut MappingContext<'_>) -> MappingResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.trigger(TriggerEvent::Created, action)
    }

    /// Run `action` after members are injected
    #[must_use]
    pub fn on_completed(
        self,
        action: impl Fn(&S, &mut T, &mut MappingContext<'_>) -> MappingResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.trigger(TriggerEvent::Completed, action)
    }

    /// Finish the definition
    #[must_use]
    pub fn build(self) -> Definition {
        self.definition
    }
}

impl<S, T> Default for DefinitionBuilder<S, T>
where
    S: Any,
    T: Any + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::FragmentCategory;
    use crate::matching::IdenticalNameStrategy;

    #[derive(Default)]
    struct Source;

    #[derive(Default)]
    struct Target {
        id: u32,
    }

    #[test]
    fn fragments_in_declaration_order() {
        let definition = DefinitionBuilder::<Source, Target>::new()
            .inherits::<u8, u16>()
            .default_factory()
            .map("id", |_: &Source| 7u32)
            .auto(IdenticalNameStrategy::new())
            .on_completed(|_, t, _| {
                t.id += 1;
                Ok(())
            })
            .build();

        let categories: Vec<_> = definition.fragments().iter().map(|f| f.category()).collect();
        assert_eq!(
            categories,
            vec![
                FragmentCategory::Inherits,
                FragmentCategory::Factory,
                FragmentCategory::Member,
                FragmentCategory::AutoInjection,
                FragmentCategory::Trigger,
            ]
        );
        assert_eq!(definition.base(), Some((TypeKey::of::<u8>(), TypeKey::of::<u16>())));
    }

    #[test]
    fn inheritance_overrides_apply_to_next_fragment_only() {
        let definition = DefinitionBuilder::<Source, Target>::new()
            .not_inherited()
            .ignore("id")
            .ignore("id")
            .inherited()
            .default_factory()
            .build();

        let flags: Vec<bool> = definition.fragments().iter().map(|f| f.is_inherited()).collect();
        assert_eq!(flags, vec![false, true, true]);
    }
}
