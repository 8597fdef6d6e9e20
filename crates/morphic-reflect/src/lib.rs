//! Morphic Reflection Gateway
//!
//! Runtime type metadata for the morphic mapping engine.
//!
//! # Core Concepts
//!
//! - [`TypeKey`]: `Copy` identity of a runtime type, with a nullability flag
//! - [`TypeDescriptor`]: members, constructors and capabilities of one type
//! - [`MemberInfo`]: borrowed get / mutable get / set accessors for a member
//! - [`TypeCatalog`]: the standard [`ReflectionGateway`] implementation
//! - [`CollectionAdapter`]: type-erased access to `Vec`, `HashSet`, ...
//! - [`InstanceRegistry`]: type-keyed service locator
//!
//! The engine core never touches concrete types directly; everything goes
//! through a [`ReflectionGateway`].
//!
//! # Example
//!
//! ```rust
//! use morphic_reflect::{MemberFilter, ReflectionGateway, TypeCatalog, TypeDescriptor, TypeKey};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Person {
//!     name: String,
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register(
//!     TypeDescriptor::builder::<Person>()
//!         .constructor(Person::default)
//!         .field("name", |p: &Person| &p.name, |p: &mut Person| &mut p.name)
//!         .build(),
//! );
//!
//! let members = catalog.members(TypeKey::of::<Person>(), MemberFilter::readable());
//! assert_eq!(members[0].name(), "name");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod catalog;
mod collection;
mod descriptor;
mod enums;
mod error;
mod key;
mod member;
mod primitive;
mod services;

// Re-exports
pub use catalog::{ReflectionGateway, TypeCatalog, ViewPath};
pub use collection::{
    CollectionAdapter, CollectionFamily, CollectionKind, BTREE_SET_FAMILY, HASH_SET_FAMILY,
    VEC_DEQUE_FAMILY, VEC_FAMILY,
};
pub use descriptor::{BaseLink, Cloner, Constructor, TypeDescriptor, TypeDescriptorBuilder, TypeNature};
pub use enums::{EnumInfo, EnumRepr};
pub use error::ReflectError;
pub use key::{value_ref, TypeKey, Value};
pub use member::{getter, getter_mut, Getter, GetterMut, MemberFilter, MemberInfo, MemberKind, Setter, Visibility};
pub use primitive::{PrimitiveInfo, PrimitiveKind};
pub use services::InstanceRegistry;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
