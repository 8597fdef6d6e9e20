//! Matching source elements to existing target elements

use crate::error::MappingResult;
use morphic_reflect::{TypeKey, Value};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Locates the existing target element a source element should merge into
///
/// A finder is created per collection merge, seeded with the drained
/// target elements, and hands each matched element out at most once.
pub trait TargetFinder: Send {
    /// Seed with the existing target elements
    fn initialize(&mut self, existing: Vec<Value>);

    /// Existing element matching `source`, removed from the pool
    ///
    /// # Errors
    /// Whatever key extraction reports
    fn find(&mut self, source: &dyn Any) -> MappingResult<Option<Value>>;
}

/// Finder that never matches
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTargetFinder;

impl TargetFinder for NullTargetFinder {
    fn initialize(&mut self, _existing: Vec<Value>) {}

    fn find(&mut self, _source: &dyn Any) -> MappingResult<Option<Value>> {
        Ok(None)
    }
}

/// Matches elements by a key extracted from both sides
pub struct KeyedTargetFinder<S, T, K> {
    source_key: Arc<dyn Fn(&S) -> K + Send + Sync>,
    target_key: Arc<dyn Fn(&T) -> K + Send + Sync>,
    pool: HashMap<K, VecDeque<Value>>,
}

impl<S, T, K> KeyedTargetFinder<S, T, K>
where
    S: Any,
    T: Any,
    K: Eq + Hash,
{
    /// Finder keyed by `source_key` / `target_key`
    #[must_use]
    pub fn new(
        source_key: impl Fn(&S) -> K + Send + Sync + 'static,
        target_key: impl Fn(&T) -> K + Send + Sync + 'static,
    ) -> Self {
        Self {
            source_key: Arc::new(source_key),
            target_key: Arc::new(target_key),
            pool: HashMap::new(),
        }
    }
}

impl<S, T, K> TargetFinder for KeyedTargetFinder<S, T, K>
where
    S: Any,
    T: Any,
    K: Eq + Hash + Send,
{
    fn initialize(&mut self, existing: Vec<Value>) {
        self.pool.clear();
        for value in existing {
            match value.downcast_ref::<T>() {
                Some(target) => {
                    let key = (self.target_key)(target);
                    self.pool.entry(key).or_default().push_back(value);
                }
                None => tracing::warn!(expected = std::any::type_name::<T>(), "foreign element dropped from finder pool"),
            }
        }
    }

    fn find(&mut self, source: &dyn Any) -> MappingResult<Option<Value>> {
        let Some(source) = source.downcast_ref::<S>() else {
            return Ok(None);
        };
        let key = (self.source_key)(source);
        Ok(self.pool.get_mut(&key).and_then(VecDeque::pop_front))
    }
}

impl<S, T, K> fmt::Debug for KeyedTargetFinder<S, T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedTargetFinder")
            .field("source", &std::any::type_name::<S>())
            .field("target", &std::any::type_name::<T>())
            .field("pooled_keys", &self.pool.len())
            .finish()
    }
}

/// Creates a fresh finder per collection merge
pub type FinderFactory = Arc<dyn Fn() -> Box<dyn TargetFinder> + Send + Sync>;

/// Finder factories per (source element, target element) pair
///
/// Registered in the engine's [`InstanceRegistry`](morphic_reflect::InstanceRegistry)
/// so collection merges can look it up.
#[derive(Default)]
pub struct TargetFinderRegistry {
    factories: RwLock<HashMap<(TypeId, TypeId), FinderFactory>>,
}

impl TargetFinderRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a pair; replaces any earlier one
    pub fn register_factory(&self, source: TypeKey, target: TypeKey, factory: FinderFactory) {
        self.factories.write().insert((source.id(), target.id()), factory);
    }

    /// Register a keyed finder for `S -> T`
    pub fn register_keyed<S, T, K>(
        &self,
        source_key: impl Fn(&S) -> K + Send + Sync + 'static,
        target_key: impl Fn(&T) -> K + Send + Sync + 'static,
    ) where
        S: Any,
        T: Any,
        K: Eq + Hash + Send + 'static,
    {
        let source_key: Arc<dyn Fn(&S) -> K + Send + Sync> = Arc::new(source_key);
        let target_key: Arc<dyn Fn(&T) -> K + Send + Sync> = Arc::new(target_key);
        let factory: FinderFactory = Arc::new(move || {
            Box::new(KeyedTargetFinder {
                source_key: Arc::clone(&source_key),
                target_key: Arc::clone(&target_key),
                pool: HashMap::new(),
            }) as Box<dyn TargetFinder>
        });
        self.register_factory(TypeKey::of::<S>(), TypeKey::of::<T>(), factory);
    }

    /// Whether a finder is registered for the pair
    #[must_use]
    pub fn contains(&self, source: TypeKey, target: TypeKey) -> bool {
        self.factories.read().contains_key(&(source.id(), target.id()))
    }

    /// Fresh finder for the pair; [`NullTargetFinder`] when none is registered
    #[must_use]
    pub fn create(&self, source: TypeKey, target: TypeKey) -> Box<dyn TargetFinder> {
        match self.factories.read().get(&(source.id(), target.id())) {
            Some(factory) => factory(),
            None => Box::new(NullTargetFinder),
        }
    }
}

impl fmt::Debug for TargetFinderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetFinderRegistry")
            .field("factories", &self.factories.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    fn rows() -> Vec<Value> {
        vec![
            Box::new(Row { id: 1, label: "a" }),
            Box::new(Row { id: 2, label: "b" }),
            Box::new(Row { id: 1, label: "c" }),
        ]
    }

    #[test]
    fn keyed_finder_hands_out_each_element_once() {
        let mut finder = KeyedTargetFinder::new(|s: &u32| *s, |t: &Row| t.id);
        finder.initialize(rows());

        let first = finder.find(&1u32).unwrap().unwrap();
        assert_eq!(first.downcast_ref::<Row>().unwrap().label, "a");
        let second = finder.find(&1u32).unwrap().unwrap();
        assert_eq!(second.downcast_ref::<Row>().unwrap().label, "c");
        assert!(finder.find(&1u32).unwrap().is_none());
        assert!(finder.find(&9u32).unwrap().is_none());
    }

    #[test]
    fn registry_falls_back_to_null_finder() {
        let registry = TargetFinderRegistry::new();
        let mut finder = registry.create(TypeKey::of::<u32>(), TypeKey::of::<Row>());
        finder.initialize(rows());
        assert!(finder.find(&1u32).unwrap().is_none());

        registry.register_keyed(|s: &u32| *s, |t: &Row| t.id);
        assert!(registry.contains(TypeKey::of::<u32>(), TypeKey::of::<Row>()));
        let mut finder = registry.create(TypeKey::of::<u32>(), TypeKey::of::<Row>());
        finder.initialize(rows());
        assert!(finder.find(&2u32).unwrap().is_some());
    }
}
