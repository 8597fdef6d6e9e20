//! Type-erased collection access
//!
//! A [`CollectionAdapter`] lets the engine clear, enumerate and refill a
//! concrete collection without knowing its element type statically.

use crate::error::ReflectError;
use crate::key::{TypeKey, Value};
use std::any::Any;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// Abstract collection interface a caller can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKind {
    /// Any enumerable sequence
    Sequence,
    /// Sized, growable collection
    Collection,
    /// Ordered, positionally addressed list
    List,
    /// Collection of unique elements
    Set,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequence => "sequence",
            Self::Collection => "collection",
            Self::List => "list",
            Self::Set => "set",
        };
        f.write_str(name)
    }
}

/// Generic collection type constructor (e.g. `Vec<_>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionFamily {
    /// Family name, unique within a catalog
    pub name: &'static str,
    /// Interfaces the family implements
    pub implements: &'static [CollectionKind],
    /// Cannot be instantiated directly
    pub is_abstract: bool,
    /// Number of generic parameters
    pub arity: usize,
}

impl CollectionFamily {
    /// Whether the family implements `kind`
    #[inline]
    #[must_use]
    pub fn implements(&self, kind: CollectionKind) -> bool {
        self.implements.contains(&kind)
    }
}

/// `Vec<T>`
pub const VEC_FAMILY: CollectionFamily = CollectionFamily {
    name: "Vec",
    implements: &[
        CollectionKind::Sequence,
        CollectionKind::Collection,
        CollectionKind::List,
    ],
    is_abstract: false,
    arity: 1,
};

/// `VecDeque<T>`
pub const VEC_DEQUE_FAMILY: CollectionFamily = CollectionFamily {
    name: "VecDeque",
    implements: &[
        CollectionKind::Sequence,
        CollectionKind::Collection,
        CollectionKind::List,
    ],
    is_abstract: false,
    arity: 1,
};

/// `HashSet<T>`
pub const HASH_SET_FAMILY: CollectionFamily = CollectionFamily {
    name: "HashSet",
    implements: &[
        CollectionKind::Sequence,
        CollectionKind::Collection,
        CollectionKind::Set,
    ],
    is_abstract: false,
    arity: 1,
};

/// `BTreeSet<T>`
pub const BTREE_SET_FAMILY: CollectionFamily = CollectionFamily {
    name: "BTreeSet",
    implements: &[
        CollectionKind::Sequence,
        CollectionKind::Collection,
        CollectionKind::Set,
    ],
    is_abstract: false,
    arity: 1,
};

/// Type-erased operations on one concrete collection type
pub trait CollectionAdapter: Send + Sync {
    /// Generic family of the collection
    fn family(&self) -> CollectionFamily;

    /// Element type
    fn element(&self) -> TypeKey;

    /// New, empty collection
    fn create(&self) -> Value;

    /// Number of elements
    ///
    /// # Errors
    /// Fails if `collection` is not of the adapted type
    fn len(&self, collection: &dyn Any) -> Result<usize, ReflectError>;

    /// Borrow every element, in iteration order
    ///
    /// # Errors
    /// Fails if `collection` is not of the adapted type
    fn items<'a>(&self, collection: &'a dyn Any) -> Result<Vec<&'a dyn Any>, ReflectError>;

    /// Remove and return every element, leaving the collection empty
    ///
    /// # Errors
    /// Fails if `collection` is not of the adapted type
    fn drain(&self, collection: &mut dyn Any) -> Result<Vec<Value>, ReflectError>;

    /// Append one element
    ///
    /// # Errors
    /// Fails on a collection or element type mismatch
    fn push(&self, collection: &mut dyn Any, item: Value) -> Result<(), ReflectError>;
}

fn mismatch<C>() -> ReflectError {
    ReflectError::mismatch("<collection>", std::any::type_name::<C>())
}

fn downcast_item<E: Any>(item: Value) -> Result<E, ReflectError> {
    item.downcast::<E>()
        .map(|b| *b)
        .map_err(|_| ReflectError::mismatch("<element>", std::any::type_name::<E>()))
}

macro_rules! adapter {
    ($name:ident, $coll:ident, $family:expr, [$($bound:path),*], $push:ident) => {
        pub(crate) struct $name<E>(PhantomData<fn() -> E>);

        impl<E> $name<E> {
            pub(crate) fn new() -> Self {
                Self(PhantomData)
            }
        }

        impl<E: Any + Send + Sync $(+ $bound)*> CollectionAdapter for $name<E> {
            fn family(&self) -> CollectionFamily {
                $family
            }

            fn element(&self) -> TypeKey {
                TypeKey::of::<E>()
            }

            fn create(&self) -> Value {
                Box::new($coll::<E>::new())
            }

            fn len(&self, collection: &dyn Any) -> Result<usize, ReflectError> {
                collection
                    .downcast_ref::<$coll<E>>()
                    .map($coll::len)
                    .ok_or_else(mismatch::<$coll<E>>)
            }

            fn items<'a>(&self, collection: &'a dyn Any) -> Result<Vec<&'a dyn Any>, ReflectError> {
                let collection = collection
                    .downcast_ref::<$coll<E>>()
                    .ok_or_else(mismatch::<$coll<E>>)?;
                Ok(collection.iter().map(|e| e as &dyn Any).collect())
            }

            fn drain(&self, collection: &mut dyn Any) -> Result<Vec<Value>, ReflectError> {
                let collection = collection
                    .downcast_mut::<$coll<E>>()
                    .ok_or_else(mismatch::<$coll<E>>)?;
                let taken = std::mem::take(collection);
                Ok(taken.into_iter().map(|e| Box::new(e) as Value).collect())
            }

            fn push(&self, collection: &mut dyn Any, item: Value) -> Result<(), ReflectError> {
                let collection = collection
                    .downcast_mut::<$coll<E>>()
                    .ok_or_else(mismatch::<$coll<E>>)?;
                collection.$push(downcast_item::<E>(item)?);
                Ok(())
            }
        }
    };
}

adapter!(VecAdapter, Vec, VEC_FAMILY, [], push);
adapter!(VecDequeAdapter, VecDeque, VEC_DEQUE_FAMILY, [], push_back);
adapter!(HashSetAdapter, HashSet, HASH_SET_FAMILY, [Eq, Hash], insert);
adapter!(BTreeSetAdapter, BTreeSet, BTREE_SET_FAMILY, [Ord], insert);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::value_ref;

    #[test]
    fn vec_adapter_drains_and_refills() {
        let adapter = VecAdapter::<u32>::new();
        let mut collection = adapter.create();

        adapter.push(collection.as_mut(), Box::new(1u32)).unwrap();
        adapter.push(collection.as_mut(), Box::new(2u32)).unwrap();
        assert_eq!(adapter.len(value_ref(&collection)).unwrap(), 2);

        let drained = adapter.drain(collection.as_mut()).unwrap();
        assert_eq!(drained.len(), 2);
        assert_eq!(adapter.len(value_ref(&collection)).unwrap(), 0);
    }

    #[test]
    fn set_adapter_deduplicates() {
        let adapter = HashSetAdapter::<String>::new();
        let mut set: HashSet<String> = HashSet::new();
        adapter.push(&mut set, Box::new("a".to_string())).unwrap();
        adapter.push(&mut set, Box::new("a".to_string())).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn push_rejects_wrong_element() {
        let adapter = VecAdapter::<u32>::new();
        let mut items: Vec<u32> = Vec::new();
        let err = adapter.push(&mut items, Box::new("x")).unwrap_err();
        assert!(matches!(err, ReflectError::TypeMismatch { .. }));
    }

    #[test]
    fn items_preserve_order() {
        let adapter = VecDequeAdapter::<i32>::new();
        let items: VecDeque<i32> = VecDeque::from(vec![3, 1, 2]);
        let borrowed = adapter.items(&items).unwrap();
        let values: Vec<i32> = borrowed
            .iter()
            .map(|v| *v.downcast_ref::<i32>().unwrap())
            .collect();
        assert_eq!(values, vec![3, 1, 2]);
    }

    #[test]
    fn family_interfaces() {
        assert!(VEC_FAMILY.implements(CollectionKind::List));
        assert!(!VEC_FAMILY.implements(CollectionKind::Set));
        assert!(HASH_SET_FAMILY.implements(CollectionKind::Set));
    }
}
