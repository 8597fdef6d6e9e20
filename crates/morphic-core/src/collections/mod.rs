//! Collection reconciliation
//!
//! Provides [`TargetFinder`] implementations for matching elements during
//! collection merges, and [`CollectionTypeResolver`] for picking a concrete
//! collection when only an interface is requested.

mod finder;
mod reconcile;
mod resolver;

pub use finder::{FinderFactory, KeyedTargetFinder, NullTargetFinder, TargetFinder, TargetFinderRegistry};
pub use resolver::CollectionTypeResolver;

pub(crate) use reconcile::Reconciler;
