//! Type descriptors
//!
//! Provides [`TypeDescriptor`] and its [`TypeDescriptorBuilder`].

use crate::collection::CollectionAdapter;
use crate::enums::EnumInfo;
use crate::error::ReflectError;
use crate::key::{TypeKey, Value};
use crate::member::{getter, getter_mut, Getter, GetterMut, MemberInfo, MemberKind, Setter, Visibility};
use crate::primitive::PrimitiveInfo;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Parameterless constructor
pub type Constructor = Arc<dyn Fn() -> Value + Send + Sync>;

/// Deep copy of a value of the described type
pub type Cloner = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;

/// Identity semantics of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeNature {
    /// No identity; can only be replaced, never merged in place
    Value,
    /// Has identity; can be merged in place
    Reference,
}

/// Embedded base type reachable from the outer type
///
/// Rust has no subtyping; a "derived" type embeds its base as a field and
/// exposes it through this link so inherited mapping fragments can view the
/// derived value as its base.
#[derive(Clone)]
pub struct BaseLink {
    key: TypeKey,
    get: Getter,
    get_mut: GetterMut,
}

impl BaseLink {
    /// Base type
    #[inline]
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Borrow the base out of the outer value
    #[inline]
    #[must_use]
    pub fn view<'a>(&self, outer: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.get)(outer)
    }

    /// Mutably borrow the base out of the outer value
    #[inline]
    #[must_use]
    pub fn view_mut<'a>(&self, outer: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.get_mut)(outer)
    }

    pub(crate) fn accessors(&self) -> (&Getter, &GetterMut) {
        (&self.get, &self.get_mut)
    }
}

impl fmt::Debug for BaseLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BaseLink").field(&self.key).finish()
    }
}

/// Everything the engine knows about one runtime type
#[derive(Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    nature: TypeNature,
    members: Vec<MemberInfo>,
    bases: Vec<BaseLink>,
    constructor: Option<Constructor>,
    named_constructors: HashMap<String, Constructor>,
    cloner: Cloner,
    primitive: Option<PrimitiveInfo>,
    enumeration: Option<EnumInfo>,
    collection: Option<Arc<dyn CollectionAdapter>>,
}

impl TypeDescriptor {
    /// Start describing `T`
    #[must_use]
    pub fn builder<T: Any + Clone + Send + Sync>() -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder::new()
    }

    /// Type key (non-nullable)
    #[inline]
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Value or reference semantics
    #[inline]
    #[must_use]
    pub fn nature(&self) -> TypeNature {
        self.nature
    }

    /// Whether values can be merged in place
    #[inline]
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.nature == TypeNature::Reference
    }

    /// Members declared directly on this type, in declaration order
    #[inline]
    #[must_use]
    pub fn own_members(&self) -> &[MemberInfo] {
        &self.members
    }

    /// Embedded bases
    #[inline]
    #[must_use]
    pub fn bases(&self) -> &[BaseLink] {
        &self.bases
    }

    /// Default constructor, if any
    #[inline]
    #[must_use]
    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// Named constructor
    #[inline]
    #[must_use]
    pub fn named_constructor(&self, name: &str) -> Option<&Constructor> {
        self.named_constructors.get(name)
    }

    /// Deep copy `value`; `None` if it is not of this type
    #[inline]
    #[must_use]
    pub fn clone_value(&self, value: &dyn Any) -> Option<Value> {
        (self.cloner)(value)
    }

    /// Primitive conversion table entry
    #[inline]
    #[must_use]
    pub fn primitive(&self) -> Option<&PrimitiveInfo> {
        self.primitive.as_ref()
    }

    /// Enumeration metadata
    #[inline]
    #[must_use]
    pub fn enumeration(&self) -> Option<&EnumInfo> {
        self.enumeration.as_ref()
    }

    /// Collection adapter
    #[inline]
    #[must_use]
    pub fn collection(&self) -> Option<&Arc<dyn CollectionAdapter>> {
        self.collection.as_ref()
    }

    pub(crate) fn with_primitive(mut self, info: PrimitiveInfo) -> Self {
        self.primitive = Some(info);
        self.nature = TypeNature::Value;
        self
    }

    pub(crate) fn with_enumeration(mut self, info: EnumInfo) -> Self {
        self.enumeration = Some(info);
        self.nature = TypeNature::Value;
        self
    }

    pub(crate) fn with_collection(mut self, adapter: Arc<dyn CollectionAdapter>) -> Self {
        let create = Arc::clone(&adapter);
        self.constructor = Some(Arc::new(move || create.create()));
        self.collection = Some(adapter);
        self
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("nature", &self.nature)
            .field("members", &self.members)
            .field("bases", &self.bases)
            .field("constructible", &self.constructor.is_some())
            .field("primitive", &self.primitive.is_some())
            .field("enumeration", &self.enumeration.is_some())
            .field("collection", &self.collection.is_some())
            .finish()
    }
}

/// Builder for [`TypeDescriptor`]
pub struct TypeDescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Clone + Send + Sync> TypeDescriptorBuilder<T> {
    fn new() -> Self {
        let cloner: Cloner = Arc::new(|value: &dyn Any| {
            value.downcast_ref::<T>().map(|v| Box::new(v.clone()) as Value)
        });
        Self {
            descriptor: TypeDescriptor {
                key: TypeKey::of::<T>(),
                nature: TypeNature::Reference,
                members: Vec::new(),
                bases: Vec::new(),
                constructor: None,
                named_constructors: HashMap::new(),
                cloner,
                primitive: None,
                enumeration: None,
                collection: None,
            },
            _marker: PhantomData,
        }
    }

    /// Mark the type as a value type (no identity, replace-only)
    #[must_use]
    pub fn value_type(mut self) -> Self {
        self.descriptor.nature = TypeNature::Value;
        self
    }

    /// Default (fallback) constructor
    #[must_use]
    pub fn constructor(mut self, ctor: fn() -> T) -> Self {
        self.descriptor.constructor = Some(Arc::new(move || Box::new(ctor()) as Value));
        self
    }

    /// Named constructor, selectable by activation fragments
    #[must_use]
    pub fn named_constructor(mut self, name: &str, ctor: fn() -> T) -> Self {
        self.descriptor
            .named_constructors
            .insert(name.to_string(), Arc::new(move || Box::new(ctor()) as Value));
        self
    }

    /// Stored field of type `F`
    #[must_use]
    pub fn field<F>(mut self, name: &str, get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self
    where
        F: Any + Send + Sync,
    {
        let member = MemberInfo::new(name, TypeKey::of::<T>(), TypeKey::of::<F>(), MemberKind::Field)
            .with_getter(getter(move |obj| {
                obj.downcast_ref::<T>().map(|t| get(t) as &dyn Any)
            }))
            .with_getter_mut(getter_mut(move |obj| {
                obj.downcast_mut::<T>().map(|t| get_mut(t) as &mut dyn Any)
            }))
            .with_setter(required_setter::<T, F>(name, move |t, v| *get_mut(t) = v));
        self.descriptor.members.push(member);
        self
    }

    /// Stored `Option<F>` field; null is `None`
    #[must_use]
    pub fn optional_field<F>(
        mut self,
        name: &str,
        get: fn(&T) -> &Option<F>,
        get_mut: fn(&mut T) -> &mut Option<F>,
    ) -> Self
    where
        F: Any + Send + Sync,
    {
        let field_name: Arc<str> = Arc::from(name);
        let setter: Setter = Arc::new(move |obj: &mut dyn Any, value: Option<Value>| {
            let owner = obj
                .downcast_mut::<T>()
                .ok_or_else(|| ReflectError::mismatch(field_name.to_string(), std::any::type_name::<T>()))?;
            let value = value
                .map(|v| {
                    v.downcast::<F>()
                        .map(|b| *b)
                        .map_err(|_| ReflectError::mismatch(field_name.to_string(), std::any::type_name::<F>()))
                })
                .transpose()?;
            *get_mut(owner) = value;
            Ok(())
        });

        let member = MemberInfo::new(
            name,
            TypeKey::of::<T>(),
            TypeKey::of::<F>().nullable(),
            MemberKind::Field,
        )
        .with_getter(getter(move |obj| {
            obj.downcast_ref::<T>()
                .and_then(|t| get(t).as_ref().map(|f| f as &dyn Any))
        }))
        .with_getter_mut(getter_mut(move |obj| {
            obj.downcast_mut::<T>()
                .and_then(|t| get_mut(t).as_mut().map(|f| f as &mut dyn Any))
        }))
        .with_setter(setter);
        self.descriptor.members.push(member);
        self
    }

    /// Property backed by an accessor pair; no in-place mutable access
    #[must_use]
    pub fn property<F>(mut self, name: &str, get: fn(&T) -> &F, set: fn(&mut T, F)) -> Self
    where
        F: Any + Send + Sync,
    {
        let member = MemberInfo::new(name, TypeKey::of::<T>(), TypeKey::of::<F>(), MemberKind::Property)
            .with_getter(getter(move |obj| {
                obj.downcast_ref::<T>().map(|t| get(t) as &dyn Any)
            }))
            .with_setter(required_setter::<T, F>(name, set));
        self.descriptor.members.push(member);
        self
    }

    /// Read-only property
    #[must_use]
    pub fn readonly_property<F>(mut self, name: &str, get: fn(&T) -> &F) -> Self
    where
        F: Any + Send + Sync,
    {
        let member = MemberInfo::new(name, TypeKey::of::<T>(), TypeKey::of::<F>(), MemberKind::Property)
            .with_getter(getter(move |obj| {
                obj.downcast_ref::<T>().map(|t| get(t) as &dyn Any)
            }));
        self.descriptor.members.push(member);
        self
    }

    /// Write-only property
    #[must_use]
    pub fn writeonly_property<F>(mut self, name: &str, set: fn(&mut T, F)) -> Self
    where
        F: Any + Send + Sync,
    {
        let member = MemberInfo::new(name, TypeKey::of::<T>(), TypeKey::of::<F>(), MemberKind::Property)
            .with_setter(required_setter::<T, F>(name, set));
        self.descriptor.members.push(member);
        self
    }

    /// Change the visibility of an already declared member
    #[must_use]
    pub fn visibility(mut self, name: &str, visibility: Visibility) -> Self {
        for member in &mut self.descriptor.members {
            if member.name() == name {
                *member = member.clone().with_visibility(visibility);
            }
        }
        self
    }

    /// Embed base `B`; its members are visible on `T` and inherited
    /// fragments declared for `B` apply to `T`
    #[must_use]
    pub fn base<B>(mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> Self
    where
        B: Any,
    {
        self.descriptor.bases.push(BaseLink {
            key: TypeKey::of::<B>(),
            get: getter(move |obj| obj.downcast_ref::<T>().map(|t| get(t) as &dyn Any)),
            get_mut: getter_mut(move |obj| {
                obj.downcast_mut::<T>().map(|t| get_mut(t) as &mut dyn Any)
            }),
        });
        self
    }

    /// Finish the descriptor
    #[must_use]
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

fn required_setter<T, F>(name: &str, assign: impl Fn(&mut T, F) + Send + Sync + 'static) -> Setter
where
    T: Any,
    F: Any + Send + Sync,
{
    let field_name: Arc<str> = Arc::from(name);
    Arc::new(move |obj: &mut dyn Any, value: Option<Value>| {
        let owner = obj
            .downcast_mut::<T>()
            .ok_or_else(|| ReflectError::mismatch(field_name.to_string(), std::any::type_name::<T>()))?;
        let value = value.ok_or_else(|| ReflectError::NullAssignment(field_name.to_string()))?;
        let value = value
            .downcast::<F>()
            .map_err(|_| ReflectError::mismatch(field_name.to_string(), std::any::type_name::<F>()))?;
        assign(owner, *value);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::value_ref;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Account {
        id: u64,
        nickname: Option<String>,
        balance: i64,
    }

    impl Account {
        fn balance(&self) -> &i64 {
            &self.balance
        }

        fn set_balance(&mut self, value: i64) {
            self.balance = value;
        }
    }

    fn account_descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Account>()
            .constructor(Account::default)
            .field("id", |a| &a.id, |a| &mut a.id)
            .optional_field("nickname", |a| &a.nickname, |a| &mut a.nickname)
            .property("balance", Account::balance, Account::set_balance)
            .visibility("balance", Visibility::Internal)
            .build()
    }

    #[test]
    fn builder_records_members_in_order() {
        let descriptor = account_descriptor();
        let names: Vec<_> = descriptor.own_members().iter().map(MemberInfo::name).collect();
        assert_eq!(names, vec!["id", "nickname", "balance"]);
        assert!(descriptor.own_members()[1].ty().is_nullable());
        assert_eq!(descriptor.own_members()[2].visibility(), Visibility::Internal);
    }

    #[test]
    fn constructor_and_clone() {
        let descriptor = account_descriptor();
        let created = (descriptor.constructor().unwrap())();
        let account = created.downcast_ref::<Account>().unwrap();
        assert_eq!(account, &Account::default());

        let copy = descriptor.clone_value(value_ref(&created)).unwrap();
        assert!(copy.downcast_ref::<Account>().is_some());
    }

    #[test]
    fn optional_field_reads_null_as_none() {
        let descriptor = account_descriptor();
        let nickname = &descriptor.own_members()[1];
        let mut account = Account::default();

        assert!(nickname.get(&account).unwrap().is_none());
        nickname
            .set(&mut account, Some(Box::new("ace".to_string())))
            .unwrap();
        assert_eq!(account.nickname.as_deref(), Some("ace"));
        nickname.set(&mut account, None).unwrap();
        assert!(account.nickname.is_none());
    }

    #[test]
    fn property_has_no_in_place_access() {
        let descriptor = account_descriptor();
        let balance = &descriptor.own_members()[2];
        let mut account = Account::default();

        assert!(!balance.is_mutable_in_place());
        balance.set(&mut account, Some(Box::new(40i64))).unwrap();
        assert_eq!(account.balance, 40);
    }

    #[test]
    fn field_setter_rejects_wrong_type() {
        let descriptor = account_descriptor();
        let id = &descriptor.own_members()[0];
        let mut account = Account::default();
        let err = id.set(&mut account, Some(Box::new("nope"))).unwrap_err();
        assert!(matches!(err, ReflectError::TypeMismatch { .. }));
    }
}
