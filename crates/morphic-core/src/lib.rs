//! Morphic Core - declarative object-graph mapping
//!
//! Maps values of one runtime type onto another from declarative
//! definitions:
//! - Definitions are ordered fragments, each carrying value shards
//! - A task pipeline compiles each definition into a transform or merge routine
//! - Composite, delegating and caching stores resolve and memoize mappings
//! - Collections are reconciled element-wise, optionally matching existing targets
//! - Enums and primitives convert by name, discriminant or explicit table
//!
//! # Example
//!
//! ```rust
//! use morphic_core::{DefinitionBuilder, EngineBuilder, IdenticalNameStrategy};
//! use morphic_reflect::{TypeCatalog, TypeDescriptor};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Person { name: String, age: u8 }
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct PersonDto { name: String, age: i32, greeting: String }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog
//!     .register(
//!         TypeDescriptor::builder::<Person>()
//!             .field("name", |p: &Person| &p.name, |p: &mut Person| &mut p.name)
//!             .field("age", |p: &Person| &p.age, |p: &mut Person| &mut p.age)
//!             .build(),
//!     )
//!     .register(
//!         TypeDescriptor::builder::<PersonDto>()
//!             .constructor(PersonDto::default)
//!             .field("name", |p: &PersonDto| &p.name, |p: &mut PersonDto| &mut p.name)
//!             .field("age", |p: &PersonDto| &p.age, |p: &mut PersonDto| &mut p.age)
//!             .field("greeting", |p: &PersonDto| &p.greeting, |p: &mut PersonDto| &mut p.greeting)
//!             .build(),
//!     );
//!
//! let engine = EngineBuilder::new(catalog)
//!     .definition(
//!         DefinitionBuilder::<Person, PersonDto>::new()
//!             .auto(IdenticalNameStrategy::new())
//!             .map("greeting", |p: &Person| format!("hello {}", p.name))
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let dto: PersonDto = engine.transform(&Person { name: "ada".into(), age: 36 }).unwrap();
//! assert_eq!(dto.age, 36);
//! assert_eq!(dto.greeting, "hello ada");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod collections;
pub mod compiler;
pub mod config;
pub mod context;
pub mod convert;
pub mod definition;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod matching;
pub mod store;

// Re-exports
pub use collections::{
    CollectionTypeResolver, FinderFactory, KeyedTargetFinder, NullTargetFinder, TargetFinder, TargetFinderRegistry,
};
pub use compiler::MappingCompiler;
pub use config::EngineConfig;
pub use context::MappingContext;
pub use convert::{ConversionTable, EnumMap};
pub use definition::{
    Definition, DefinitionBuilder, DefinitionRegistry, Fragment, FragmentCategory, FragmentKind, NullSourceBehavior,
    Shard, ShardKind, TriggerEvent,
};
pub use engine::{Engine, EngineBuilder};
pub use error::{MappingError, MappingResult, RegistrationError};
pub use mapping::{ConstructionStrategy, Mapping, MappingKind, Merge, MergeResult, PostMergeAction, Transform};
pub use matching::{IdenticalNameStrategy, MatchingStrategy, RegexNameStrategy};
pub use store::{
    CacheStats, CachingStore, CollectionStore, CompositeStore, ConversionStore, DefinitionStore, MappingCollectionStore,
    MappingStore,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for defining and running mappings
    pub use crate::{
        DefinitionBuilder, Engine, EngineBuilder, EngineConfig, IdenticalNameStrategy, MappingError, MappingKind,
        MappingResult, PostMergeAction, Shard,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
