//! Runtime type identity

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Owned, type-erased value flowing through compiled mappings
///
/// "null" is represented as `None` wherever an `Option<Value>` appears.
pub type Value = Box<dyn Any + Send + Sync>;

/// Borrow the payload of a [`Value`] as `&dyn Any`
///
/// Calling `as_any()`-style helpers on the box itself would report the type
/// of the box; this always reaches the boxed value.
#[inline]
#[must_use]
pub fn value_ref(value: &Value) -> &dyn Any {
    &**value
}

/// Identity of a runtime type
///
/// Two keys are equal when they name the same type and agree on
/// nullability. The type name is carried for diagnostics only.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    nullable: bool,
}

impl TypeKey {
    /// Key for `T`, non-nullable
    #[inline]
    #[must_use]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            nullable: false,
        }
    }

    /// Same type, marked nullable
    #[inline]
    #[must_use]
    pub fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    /// Same type, marked non-nullable
    #[inline]
    #[must_use]
    pub fn non_nullable(self) -> Self {
        Self {
            nullable: false,
            ..self
        }
    }

    /// Whether null is an acceptable value for this key
    #[inline]
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Underlying `TypeId`
    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Same type regardless of nullability
    #[inline]
    #[must_use]
    pub fn same_type(&self, other: &TypeKey) -> bool {
        self.id == other.id
    }

    /// Whether this key names `T`
    #[inline]
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Whether `value` is an instance of this type
    #[inline]
    #[must_use]
    pub fn matches(&self, value: &dyn Any) -> bool {
        value.type_id() == self.id
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.nullable == other.nullable
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.nullable.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({self})")
    }
}
