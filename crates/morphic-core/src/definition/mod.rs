//! Definition model
//!
//! A [`Definition`] is the ordered, append-only list of [`Fragment`]s
//! describing how one (source, target) pair is mapped.

mod builder;
mod fragment;
mod registry;
mod shard;

pub use builder::DefinitionBuilder;
pub use fragment::{
    FactoryFn, Fragment, FragmentCategory, FragmentKind, NullFactoryFn, NullSourceBehavior, TriggerEvent,
    TriggerFn, ValueFactory,
};
pub use registry::DefinitionRegistry;
pub use shard::{CallFn, ConstantFn, LambdaFn, PredicateFn, Shard, ShardKind};

use morphic_reflect::TypeKey;
use std::sync::Arc;

/// Fragments for exactly one (source, target) pair
#[derive(Debug, Clone)]
pub struct Definition {
    source: TypeKey,
    target: TypeKey,
    fragments: Vec<Arc<Fragment>>,
}

impl Definition {
    /// Empty definition for `(source, target)`
    #[must_use]
    pub fn new(source: TypeKey, target: TypeKey) -> Self {
        Self {
            source: source.non_nullable(),
            target: target.non_nullable(),
            fragments: Vec::new(),
        }
    }

    /// Append a fragment
    ///
    /// Fragments declared for another pair are rebound to this one.
    pub fn push(&mut self, fragment: Fragment) {
        let fragment = if fragment.source().same_type(&self.source) && fragment.target().same_type(&self.target) {
            fragment
        } else {
            tracing::warn!(
                definition = %format_args!("{} -> {}", self.source, self.target),
                fragment = ?fragment.category(),
                "fragment rebound to definition pair"
            );
            Fragment::new(self.source, self.target, fragment.kind().clone()).with_inherited(fragment.is_inherited())
        };
        self.fragments.push(Arc::new(fragment));
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

    /// Fragments in declaration order
    #[inline]
    #[must_use]
    pub fn fragments(&self) -> &[Arc<Fragment>] {
        &self.fragments
    }

    /// Base pair named by the last inheritance fragment
    #[must_use]
    pub fn base(&self) -> Option<(TypeKey, TypeKey)> {
        self.fragments.iter().rev().find_map(|f| match f.kind() {
            FragmentKind::Inherits { source, target } => Some((*source, *target)),
            _ => None,
        })
    }

    /// Whether the definition is for `(source, target)`
    #[inline]
    #[must_use]
    pub fn is_for(&self, source: TypeKey, target: TypeKey) -> bool {
        self.source.same_type(&source) && self.target.same_type(&target)
    }
}
