//! Compiled mapping objects
//!
//! Provides [`Transform`] and [`Merge`], the immutable, directly callable
//! results of compilation, and the [`Mapping`] handle stores hand out.

use crate::context::MappingContext;
use crate::error::MappingResult;
use morphic_reflect::{TypeKey, Value};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Which entry point a caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    /// Build a new target from a source
    Transform,
    /// Update an existing target from a source
    Merge,
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform => f.write_str("transform"),
            Self::Merge => f.write_str("merge"),
        }
    }
}

/// How a compiled mapping constructs its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionStrategy {
    /// Named or default constructor selected by an activation fragment
    Activate,
    /// `Default` value supplied by a default-factory fragment
    DefaultFactory,
    /// User callable over the source
    CustomFactory,
    /// Constructor registered with the type descriptor
    Fallback,
}

/// Signal returned by a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PostMergeAction {
    /// Target was updated in place
    #[default]
    None,
    /// Caller must substitute the returned target
    Replace,
}

/// Outcome of a merge call
#[derive(Debug)]
pub struct MergeResult {
    action: PostMergeAction,
    replacement: Option<Value>,
}

impl MergeResult {
    /// Target updated in place
    #[inline]
    #[must_use]
    pub fn updated() -> Self {
        Self {
            action: PostMergeAction::None,
            replacement: None,
        }
    }

    /// Caller must replace its target with `value` (`None` is null)
    #[inline]
    #[must_use]
    pub fn replace(value: Option<Value>) -> Self {
        Self {
            action: PostMergeAction::Replace,
            replacement: value,
        }
    }

    /// Post-merge action
    #[inline]
    #[must_use]
    pub fn action(&self) -> PostMergeAction {
        self.action
    }

    /// Whether the caller must replace its target
    #[inline]
    #[must_use]
    pub fn is_replace(&self) -> bool {
        self.action == PostMergeAction::Replace
    }

    /// Replacement target; `None` for in-place updates or a null replacement
    #[inline]
    #[must_use]
    pub fn into_replacement(self) -> Option<Value> {
        self.replacement
    }
}

/// Entry point of a compiled transform
pub type TransformFn =
    dyn Fn(Option<&dyn Any>, &mut MappingContext<'_>) -> MappingResult<Option<Value>> + Send + Sync;

/// Entry point of a compiled merge
pub type MergeFn = dyn Fn(Option<&dyn Any>, Option<&mut dyn Any>, &mut MappingContext<'_>) -> MappingResult<MergeResult>
    + Send
    + Sync;

/// Compiled source-to-new-target mapping
pub struct Transform {
    source: TypeKey,
    target: TypeKey,
    strategy: Option<ConstructionStrategy>,
    routine: Box<TransformFn>,
}

impl Transform {
    /// Wrap a routine as a transform
    pub fn new<F>(source: TypeKey, target: TypeKey, routine: F) -> Self
    where
        F: Fn(Option<&dyn Any>, &mut MappingContext<'_>) -> MappingResult<Option<Value>> + Send + Sync + 'static,
    {
        Self {
            source,
            target,
            strategy: None,
            routine: Box::new(routine),
        }
    }

    /// Typed convenience over [`Transform::new`]; a null source yields null
    pub fn typed<S, T, F>(f: F) -> Self
    where
        S: Any,
        T: Any + Send + Sync,
        F: Fn(&S, &mut MappingContext<'_>) -> MappingResult<T> + Send + Sync + 'static,
    {
        Self::new(TypeKey::of::<S>(), TypeKey::of::<T>(), move |source, ctx| {
            let Some(source) = source else {
                return Ok(None);
            };
            let source = source
                .downcast_ref::<S>()
                .ok_or_else(crate::error::MappingError::type_mismatch::<S>)?;
            Ok(Some(Box::new(f(source, ctx)?) as Value))
        })
    }

    /// Record the construction strategy the routine uses
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: ConstructionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Source type
    #[inline]
    #[must_use]
    pub fn source(&self) -> TypeKey {
        self.source
    }

    /// Target type
    #[inline]
    #[must_use]
    pub fn target(&self) -> TypeKey {
        self.target
    }

    /// Construction strategy, when the routine constructs targets itself
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> Option<ConstructionStrategy> {
        self.strategy
    }

    /// Run the routine without depth accounting
    ///
    /// Prefer [`MappingContext::run_transform`] from within other routines.
    ///
    /// # Errors
    /// Whatever the routine reports
    pub fn apply(&self, source: Option<&dyn Any>, ctx: &mut MappingContext<'_>) -> MappingResult<Option<Value>> {
        (self.routine)(source, ctx)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Compiled source-into-existing-target mapping
pub struct Merge {
    source: TypeKey,
    target: TypeKey,
    strategy: Option<ConstructionStrategy>,
    routine: Box<MergeFn>,
}

impl Merge {
    /// Wrap a routine as a merge
    pub fn new<F>(source: TypeKey, target: TypeKey, routine: F) -> Self
    where
        F: Fn(Option<&dyn Any>, Option<&mut dyn Any>, &mut MappingContext<'_>) -> MappingResult<MergeResult>
            + Send
            + Sync
            + 'static,
    {
        Self {
            source,
            target,
            strategy: None,
            routine: Box::new(routine),
        }
    }

    /// Merge that always replaces the target with a fresh transform
    #[must_use]
    pub fn replacing(transform: Arc<Transform>) -> Self {
        let strategy = transform.strategy();
        let mut merge = Self::new(transform.source(), transform.target(), move |source, _target, ctx| {
            ctx.run_transform(&transform, source).map(MergeResult::replace)
        });
        merge.strategy = strategy;
        merge
    }

    /// Record the construction strategy used when the target is null
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: ConstructionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Source type
    #[inline]
    #[must_use]
    pub fn source(&self) -> TypeKey {
        self.source
    }

    /// Target type
    #[inline]
    #[must_use]
    pub fn target(&self) -> TypeKey {
        self.target
    }

    /// Construction strategy for null targets
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> Option<ConstructionStrategy> {
        self.strategy
    }

    /// Run the routine without depth accounting
    ///
    /// # Errors
    /// Whatever the routine reports
    pub fn apply(
        &self,
        source: Option<&dyn Any>,
        target: Option<&mut dyn Any>,
        ctx: &mut MappingContext<'_>,
    ) -> MappingResult<MergeResult> {
        (self.routine)(source, target, ctx)
    }
}

impl fmt::Debug for Merge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merge")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Shared handle to a compiled mapping
#[derive(Debug, Clone)]
pub enum Mapping {
    /// Transform entry point
    Transform(Arc<Transform>),
    /// Merge entry point
    Merge(Arc<Merge>),
}

impl Mapping {
    /// Kind of entry point
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MappingKind {
        match self {
            Self::Transform(_) => MappingKind::Transform,
            Self::Merge(_) => MappingKind::Merge,
        }
    }

    /// Source type
    #[must_use]
    pub fn source(&self) -> TypeKey {
        match self {
            Self::Transform(t) => t.source(),
            Self::Merge(m) => m.source(),
        }
    }

    /// Target type
    #[must_use]
    pub fn target(&self) -> TypeKey {
        match self {
            Self::Transform(t) => t.target(),
            Self::Merge(m) => m.target(),
        }
    }

    /// Construction strategy of the compiled routine
    #[must_use]
    pub fn strategy(&self) -> Option<ConstructionStrategy> {
        match self {
            Self::Transform(t) => t.strategy(),
            Self::Merge(m) => m.strategy(),
        }
    }

    /// Transform entry point, if this is one
    #[must_use]
    pub fn as_transform(&self) -> Option<&Arc<Transform>> {
        match self {
            Self::Transform(t) => Some(t),
            Self::Merge(_) => None,
        }
    }

    /// Merge entry point, if this is one
    #[must_use]
    pub fn as_merge(&self) -> Option<&Arc<Merge>> {
        match self {
            Self::Merge(m) => Some(m),
            Self::Transform(_) => None,
        }
    }

    /// Whether both handles point at the same compiled object
    #[must_use]
    pub fn ptr_eq(&self, other: &Mapping) -> bool {
        match (self, other) {
            (Self::Transform(a), Self::Transform(b)) => Arc::ptr_eq(a, b),
            (Self::Merge(a), Self::Merge(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Transform> for Mapping {
    fn from(transform: Transform) -> Self {
        Self::Transform(Arc::new(transform))
    }
}

impl From<Merge> for Mapping {
    fn from(merge: Merge) -> Self {
        Self::Merge(Arc::new(merge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_result_flags() {
        let updated = MergeResult::updated();
        assert_eq!(updated.action(), PostMergeAction::None);
        assert!(!updated.is_replace());

        let replaced = MergeResult::replace(Some(Box::new(5u8)));
        assert!(replaced.is_replace());
        assert_eq!(
            replaced.into_replacement().unwrap().downcast_ref::<u8>(),
            Some(&5)
        );
    }

    #[test]
    fn mapping_accessors() {
        let mapping: Mapping = Transform::typed::<u8, u16, _>(|v, _| Ok(u16::from(*v)))
            .with_strategy(ConstructionStrategy::CustomFactory)
            .into();
        assert_eq!(mapping.kind(), MappingKind::Transform);
        assert_eq!(mapping.source(), TypeKey::of::<u8>());
        assert_eq!(mapping.target(), TypeKey::of::<u16>());
        assert_eq!(mapping.strategy(), Some(ConstructionStrategy::CustomFactory));
        assert!(mapping.as_merge().is_none());
        assert!(mapping.ptr_eq(&mapping.clone()));
    }

    #[test]
    fn kind_display() {
        assert_eq!(MappingKind::Transform.to_string(), "transform");
        assert_eq!(MappingKind::Merge.to_string(), "merge");
    }
}
