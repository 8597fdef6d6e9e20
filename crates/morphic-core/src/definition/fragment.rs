//! Mapping fragments
//!
//! A [`Fragment`] is one declarative unit of mapping intent for a
//! (source, target) pair.

use crate::context::MappingContext;
use crate::definition::shard::Shard;
use crate::error::MappingResult;
use crate::matching::MatchingStrategy;
use morphic_reflect::{TypeKey, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Builds a target from the source
pub type FactoryFn = Arc<dyn Fn(&dyn Any, &mut MappingContext<'_>) -> MappingResult<Value> + Send + Sync>;

/// Builds a value with no input
pub type ValueFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Builds the target for a null source
pub type NullFactoryFn = Arc<dyn Fn(&mut MappingContext<'_>) -> MappingResult<Option<Value>> + Send + Sync>;

/// Lifecycle callback over source and target
pub type TriggerFn = Arc<dyn Fn(&dyn Any, &mut dyn Any, &mut MappingContext<'_>) -> MappingResult<()> + Send + Sync>;

/// Stable fragment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentCategory {
    /// Target construction strategy
    Factory,
    /// Null source handling
    NullSource,
    /// Lifecycle callback
    Trigger,
    /// Explicit member configuration
    Member,
    /// Inheritance declaration
    Inherits,
    /// Automatic member matching
    AutoInjection,
}

/// Lifecycle event a trigger fires on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    /// Target has just been constructed
    Created,
    /// Members have been injected; about to return
    Completed,
}

/// What a mapping does for a null source
#[derive(Clone)]
pub enum NullSourceBehavior {
    /// Produce the target type's default value
    Default(ValueFactory),
    /// Invoke a null-target factory
    Factory(NullFactoryFn),
}

/// Fragment payload
#[derive(Clone)]
pub enum FragmentKind {
    /// Fold in the inherited fragments of a base pair
    Inherits {
        /// Base source type
        source: TypeKey,
        /// Base target type
        target: TypeKey,
    },
    /// Construct through a descriptor constructor (`None` = default one)
    Activate {
        /// Named constructor
        constructor: Option<String>,
    },
    /// Construct the target's `Default` value
    DefaultFactory(ValueFactory),
    /// Construct through a user callable over the source
    CustomFactory(FactoryFn),
    /// Null source handling
    NullSource(NullSourceBehavior),
    /// Explicit target member configuration
    Member {
        /// Target member name
        name: String,
        /// Value sources and guards, in declaration order
        shards: Vec<Shard>,
    },
    /// Automatic member matching
    AutoInjection(Arc<dyn MatchingStrategy>),
    /// Lifecycle callback
    Trigger {
        /// Event
        event: TriggerEvent,
        /// Callback
        action: TriggerFn,
    },
}

impl FragmentKind {
    /// Category of this payload
    #[must_use]
    pub fn category(&self) -> FragmentCategory {
        match self {
            Self::Inherits { .. } => FragmentCategory::Inherits,
            Self::Activate { .. } | Self::DefaultFactory(_) | Self::CustomFactory(_) => FragmentCategory::Factory,
            Self::NullSource(_) => FragmentCategory::NullSource,
            Self::Member { .. } => FragmentCategory::Member,
            Self::AutoInjection(_) => FragmentCategory::AutoInjection,
            Self::Trigger { .. } => FragmentCategory::Trigger,
        }
    }
}

/// One unit of mapping intent
#[derive(Clone)]
pub struct Fragment {
    source: TypeKey,
    target: TypeKey,
    inherited: bool,
    kind: FragmentKind,
}

impl Fragment {
    /// Fragment for `(source, target)`
    ///
    /// Factory and inheritance fragments default to not inherited; all
    /// others propagate to derived pairs.
    #[must_use]
    pub fn new(source: TypeKey, target: TypeKey, kind: FragmentKind) -> Self {
        let inherited = !matches!(
            kind.category(),
            FragmentCategory::Factory | FragmentCategory::Inherits
        );
        Self {
            source,
            target,
            inherited,
            kind,
        }
    }

    /// Override inheritance
    #[inline]
    #[must_use]
    pub fn with_inherited(mut self, inherited: bool) -> Self {
        self.inherited = inherited;
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

    /// Whether the fragment propagates to derived pairs
    #[inline]
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// Payload
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &FragmentKind {
        &self.kind
    }

    /// Category
    #[inline]
    #[must_use]
    pub fn category(&self) -> FragmentCategory {
        self.kind.category()
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Fragment");
        s.field("source", &self.source)
            .field("target", &self.target)
            .field("inherited", &self.inherited)
            .field("category", &self.category());
        match &self.kind {
            FragmentKind::Inherits { source, target } => s.field("base", &(source, target)),
            FragmentKind::Activate { constructor } => s.field("constructor", constructor),
            FragmentKind::Member { name, shards } => s.field("member", name).field("shards", shards),
            FragmentKind::AutoInjection(strategy) => s.field("strategy", &strategy.name()),
            FragmentKind::Trigger { event, .. } => s.field("event", event),
            _ => &mut s,
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_inheritance_by_category() {
        let src = TypeKey::of::<u8>();
        let dst = TypeKey::of::<u16>();

        let factory = Fragment::new(src, dst, FragmentKind::Activate { constructor: None });
        assert_eq!(factory.category(), FragmentCategory::Factory);
        assert!(!factory.is_inherited());

        let member = Fragment::new(
            src,
            dst,
            FragmentKind::Member {
                name: "x".into(),
                shards: vec![Shard::never()],
            },
        );
        assert!(member.is_inherited());
        assert!(!member.with_inherited(false).is_inherited());
    }

    #[test]
    fn debug_names_member() {
        let member = Fragment::new(
            TypeKey::of::<u8>(),
            TypeKey::of::<u16>(),
            FragmentKind::Member {
                name: "total".into(),
                shards: Vec::new(),
            },
        );
        assert!(format!("{member:?}").contains("total"));
    }
}
