//! Member metadata and accessors
//!
//! A [`MemberInfo`] exposes one field or property of a registered type
//! through type-erased accessors. Reads borrow from the owning value so the
//! identity (address) of nested objects is preserved across a mapping call.

use crate::error::ReflectError;
use crate::key::{TypeKey, Value};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Borrowing read accessor
pub type Getter = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

/// Mutable read accessor
pub type GetterMut = Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;

/// Write accessor; `None` stores null
pub type Setter = Arc<dyn Fn(&mut dyn Any, Option<Value>) -> Result<(), ReflectError> + Send + Sync>;

/// Wrap a borrowing closure as a [`Getter`]
///
/// Taking the closure through a generic bound lets the compiler infer the
/// higher-ranked signature.
pub fn getter<F>(f: F) -> Getter
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a mutably borrowing closure as a [`GetterMut`]
pub fn getter_mut<F>(f: F) -> GetterMut
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Field or property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Stored field, readable and writable in place
    Field,
    /// Accessor pair; may lack in-place mutable access
    Property,
}

/// Member visibility, ordered from most to least visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Part of the type's public surface
    #[default]
    Public,
    /// Crate/assembly internal
    Internal,
    /// Private to the type
    Private,
}

/// Visibility and access flags used when enumerating members
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberFilter {
    /// Least visible member still included
    pub visibility: Visibility,
    /// Require a read accessor
    pub readable: bool,
    /// Require a write accessor
    pub writable: bool,
}

impl MemberFilter {
    /// Public members with a read accessor
    #[inline]
    #[must_use]
    pub fn readable() -> Self {
        Self {
            visibility: Visibility::Public,
            readable: true,
            writable: false,
        }
    }

    /// Public members with a write accessor
    #[inline]
    #[must_use]
    pub fn writable() -> Self {
        Self {
            visibility: Visibility::Public,
            readable: false,
            writable: true,
        }
    }

    /// Every member, whatever its visibility or accessors
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self {
            visibility: Visibility::Private,
            readable: false,
            writable: false,
        }
    }

    /// Widen the visibility threshold
    #[inline]
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Whether `member` passes this filter
    #[must_use]
    pub fn accepts(&self, member: &MemberInfo) -> bool {
        member.visibility <= self.visibility
            && (!self.readable || member.is_readable())
            && (!self.writable || member.is_writable())
    }
}

/// One field or property of a registered type
#[derive(Clone)]
pub struct MemberInfo {
    name: Arc<str>,
    owner: TypeKey,
    ty: TypeKey,
    kind: MemberKind,
    visibility: Visibility,
    get: Option<Getter>,
    get_mut: Option<GetterMut>,
    set: Option<Setter>,
}

impl MemberInfo {
    /// Create a member with no accessors
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, owner: TypeKey, ty: TypeKey, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            owner,
            ty,
            kind,
            visibility: Visibility::Public,
            get: None,
            get_mut: None,
            set: None,
        }
    }

    /// Attach a read accessor
    #[inline]
    #[must_use]
    pub fn with_getter(mut self, get: Getter) -> Self {
        self.get = Some(get);
        self
    }

    /// Attach a mutable read accessor
    #[inline]
    #[must_use]
    pub fn with_getter_mut(mut self, get_mut: GetterMut) -> Self {
        self.get_mut = Some(get_mut);
        self
    }

    /// Attach a write accessor
    #[inline]
    #[must_use]
    pub fn with_setter(mut self, set: Setter) -> Self {
        self.set = Some(set);
        self
    }

    /// Change visibility
    #[inline]
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Member name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring type
    #[inline]
    #[must_use]
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    /// Declared member type; nullable for optional members
    #[inline]
    #[must_use]
    pub fn ty(&self) -> TypeKey {
        self.ty
    }

    /// Field or property
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Visibility
    #[inline]
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Has a read accessor
    #[inline]
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.get.is_some()
    }

    /// Has a write accessor
    #[inline]
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    /// Supports in-place mutable access
    #[inline]
    #[must_use]
    pub fn is_mutable_in_place(&self) -> bool {
        self.get_mut.is_some()
    }

    /// Read the member; `Ok(None)` means the member holds null
    ///
    /// # Errors
    /// Fails if the member is write-only or `owner` is not the declaring type
    pub fn get<'a>(&self, owner: &'a dyn Any) -> Result<Option<&'a dyn Any>, ReflectError> {
        let get = self
            .get
            .as_ref()
            .ok_or_else(|| ReflectError::NotReadable(self.name.to_string()))?;
        self.check_owner(owner.type_id())?;
        Ok(get(owner))
    }

    /// Borrow the member mutably; `Ok(None)` means null or no in-place access
    ///
    /// # Errors
    /// Fails if `owner` is not the declaring type
    pub fn get_mut<'a>(&self, owner: &'a mut dyn Any) -> Result<Option<&'a mut dyn Any>, ReflectError> {
        let Some(get_mut) = self.get_mut.as_ref() else {
            return Ok(None);
        };
        self.check_owner((*owner).type_id())?;
        Ok(get_mut(owner))
    }

    /// Write the member
    ///
    /// # Errors
    /// Fails if read-only, if `value` has the wrong type, or on null into a
    /// non-nullable member
    pub fn set(&self, owner: &mut dyn Any, value: Option<Value>) -> Result<(), ReflectError> {
        let set = self
            .set
            .as_ref()
            .ok_or_else(|| ReflectError::NotWritable(self.name.to_string()))?;
        self.check_owner((*owner).type_id())?;
        if value.is_none() && !self.ty.is_nullable() {
            return Err(ReflectError::NullAssignment(self.name.to_string()));
        }
        set(owner, value)
    }

    /// Same member reached through an accessor path onto a containing type
    ///
    /// Used to flatten members of an embedded base into the outer type.
    #[must_use]
    pub fn rebased(&self, outer: TypeKey, base_get: &Getter, base_get_mut: &GetterMut) -> MemberInfo {
        let mut rebased = self.clone();
        rebased.owner = outer;

        rebased.get = self.get.as_ref().map(|inner| {
            let outer_get = Arc::clone(base_get);
            let inner = Arc::clone(inner);
            getter(move |obj| outer_get(obj).and_then(|base| inner(base)))
        });

        rebased.get_mut = self.get_mut.as_ref().map(|inner| {
            let outer_get = Arc::clone(base_get_mut);
            let inner = Arc::clone(inner);
            getter_mut(move |obj| outer_get(obj).and_then(|base| inner(base)))
        });

        rebased.set = self.set.as_ref().map(|inner| {
            let outer_get = Arc::clone(base_get_mut);
            let inner = Arc::clone(inner);
            let name = Arc::clone(&self.name);
            let set: Setter = Arc::new(move |obj: &mut dyn Any, value: Option<Value>| {
                let base = outer_get(obj).ok_or_else(|| ReflectError::NotWritable(name.to_string()))?;
                inner(base, value)
            });
            set
        });

        rebased
    }

    fn check_owner(&self, actual: std::any::TypeId) -> Result<(), ReflectError> {
        if actual == self.owner.id() {
            Ok(())
        } else {
            Err(ReflectError::mismatch(self.name.to_string(), self.owner.name()))
        }
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("ty", &self.ty)
            .field("kind", &self.kind)
            .field("visibility", &self.visibility)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Probe {
        count: u32,
    }

    fn count_member() -> MemberInfo {
        MemberInfo::new("count", TypeKey::of::<Probe>(), TypeKey::of::<u32>(), MemberKind::Field)
            .with_getter(getter(|obj| {
                obj.downcast_ref::<Probe>().map(|p| &p.count as &dyn Any)
            }))
            .with_setter(Arc::new(|obj: &mut dyn Any, value: Option<Value>| {
                let probe = obj
                    .downcast_mut::<Probe>()
                    .ok_or_else(|| ReflectError::mismatch("count", "Probe"))?;
                let value = value.ok_or_else(|| ReflectError::NullAssignment("count".into()))?;
                probe.count = *value
                    .downcast::<u32>()
                    .map_err(|_| ReflectError::mismatch("count", "u32"))?;
                Ok(())
            }))
    }

    #[test]
    fn get_and_set_round_through_accessors() {
        let member = count_member();
        let mut probe = Probe::default();

        member.set(&mut probe, Some(Box::new(9u32))).unwrap();
        let read = member.get(&probe).unwrap().unwrap();
        assert_eq!(read.downcast_ref::<u32>(), Some(&9));
    }

    #[test]
    fn set_rejects_null_for_non_nullable() {
        let member = count_member();
        let mut probe = Probe::default();
        let err = member.set(&mut probe, None).unwrap_err();
        assert_eq!(err, ReflectError::NullAssignment("count".into()));
    }

    #[test]
    fn get_rejects_foreign_owner() {
        let member = count_member();
        let err = member.get(&5u8).unwrap_err();
        assert!(matches!(err, ReflectError::TypeMismatch { .. }));
    }

    #[test]
    fn filter_respects_visibility_order() {
        let member = count_member().with_visibility(Visibility::Internal);
        assert!(!MemberFilter::readable().accepts(&member));
        assert!(MemberFilter::readable()
            .with_visibility(Visibility::Internal)
            .accepts(&member));
        assert!(!MemberFilter::writable().with_visibility(Visibility::Private).accepts(
            &MemberInfo::new("x", TypeKey::of::<Probe>(), TypeKey::of::<u32>(), MemberKind::Property)
        ));
    }
}
