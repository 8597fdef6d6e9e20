//! Enum and primitive conversion
//!
//! Explicit lookup maps registered in a [`ConversionTable`] take priority;
//! otherwise values are bridged structurally: enum names, discriminants,
//! checked numeric conversion, parsing and stringification.

use crate::error::{MappingError, MappingResult};
use morphic_reflect::{EnumInfo, PrimitiveInfo, PrimitiveKind, ReflectionGateway, TypeKey, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type LookupFn = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;

/// Explicit value-to-value table from `S` to `T`
///
/// ```rust
/// use morphic_core::{ConversionTable, EnumMap};
///
/// let mut table = ConversionTable::new();
/// table.register(EnumMap::new().entry(0u8, "off".to_string()).entry(1u8, "on".to_string()));
/// assert!(table.has_map(
///     morphic_reflect::TypeKey::of::<u8>(),
///     morphic_reflect::TypeKey::of::<String>()
/// ));
/// ```
pub struct EnumMap<S, T> {
    entries: Vec<(S, T)>,
    _marker: PhantomData<fn(S) -> T>,
}

impl<S, T> EnumMap<S, T>
where
    S: Any + PartialEq + Send + Sync,
    T: Any + Clone + Send + Sync,
{
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Map `from` to `to`; the first entry for a value wins
    #[must_use]
    pub fn entry(mut self, from: S, to: T) -> Self {
        self.entries.push((from, to));
        self
    }

    fn into_lookup(self) -> LookupFn {
        let entries = self.entries;
        Arc::new(move |value: &dyn Any| {
            let value = value.downcast_ref::<S>()?;
            entries
                .iter()
                .find(|(from, _)| from == value)
                .map(|(_, to)| Box::new(to.clone()) as Value)
        })
    }
}

impl<S, T> Default for EnumMap<S, T>
where
    S: Any + PartialEq + Send + Sync,
    T: Any + Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Registered explicit conversion maps
#[derive(Clone, Default)]
pub struct ConversionTable {
    maps: HashMap<(TypeId, TypeId), LookupFn>,
}

enum Scalar<'d> {
    Primitive(&'d PrimitiveInfo),
    Enum(&'d EnumInfo),
}

impl ConversionTable {
    /// Create new empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an explicit map; replaces any earlier map for the pair
    pub fn register<S, T>(&mut self, map: EnumMap<S, T>) -> &mut Self
    where
        S: Any + PartialEq + Send + Sync,
        T: Any + Clone + Send + Sync,
    {
        let key = (TypeId::of::<S>(), TypeId::of::<T>());
        if self.maps.insert(key, map.into_lookup()).is_some() {
            tracing::warn!(
                from = std::any::type_name::<S>(),
                to = std::any::type_name::<T>(),
                "explicit conversion map replaced"
            );
        }
        self
    }

    /// Whether an explicit map exists for the pair
    #[inline]
    #[must_use]
    pub fn has_map(&self, from: TypeKey, to: TypeKey) -> bool {
        self.maps.contains_key(&(from.id(), to.id()))
    }

    /// Whether `from` can be converted to `to`
    #[must_use]
    pub fn supports(&self, gateway: &dyn ReflectionGateway, from: TypeKey, to: TypeKey) -> bool {
        if self.has_map(from, to) || (from.same_type(&to) && gateway.contains(from)) {
            return true;
        }
        let (Some(fd), Some(td)) = (gateway.descriptor(from), gateway.descriptor(to)) else {
            return false;
        };
        match (scalar(fd.primitive(), fd.enumeration()), scalar(td.primitive(), td.enumeration())) {
            (Some(Scalar::Enum(_)), Some(Scalar::Enum(_))) => true,
            (Some(Scalar::Enum(_)), Some(Scalar::Primitive(p))) | (Some(Scalar::Primitive(p)), Some(Scalar::Enum(_))) => {
                matches!(p.kind, PrimitiveKind::Text | PrimitiveKind::Integer)
            }
            (Some(Scalar::Primitive(f)), Some(Scalar::Primitive(t))) => {
                f.kind == PrimitiveKind::Text
                    || t.kind == PrimitiveKind::Text
                    || (f.as_integer.is_some() && t.from_integer.is_some())
                    || (f.as_float.is_some() && (t.from_float.is_some() || t.from_integer.is_some()))
            }
            _ => false,
        }
    }

    /// Convert `value` from `from` to `to`
    ///
    /// # Errors
    /// [`MappingError::ConversionFailed`] when the value has no counterpart
    /// (unknown variant name, out-of-range number, unparsable text)
    pub fn convert(
        &self,
        gateway: &dyn ReflectionGateway,
        value: &dyn Any,
        from: TypeKey,
        to: TypeKey,
    ) -> MappingResult<Value> {
        if let Some(lookup) = self.maps.get(&(from.id(), to.id())) {
            if let Some(mapped) = lookup(value) {
                return Ok(mapped);
            }
        }
        if from.same_type(&to) {
            return gateway
                .clone_value(to, value)
                .ok_or_else(|| MappingError::conversion(from, to, "type is not registered"));
        }

        let (Some(fd), Some(td)) = (gateway.descriptor(from), gateway.descriptor(to)) else {
            return Err(MappingError::conversion(from, to, "type is not registered"));
        };
        let fail = |reason: &str| MappingError::conversion(from, to, reason);

        match (scalar(fd.primitive(), fd.enumeration()), scalar(td.primitive(), td.enumeration())) {
            (Some(Scalar::Enum(fe)), Some(Scalar::Enum(te))) => {
                let name = fe.name_of(value).ok_or_else(|| fail("not a variant"))?;
                te.from_name(name)
                    .ok_or_else(|| fail(&format!("no variant named '{name}'")))
            }
            (Some(Scalar::Enum(fe)), Some(Scalar::Primitive(tp))) => {
                if tp.kind == PrimitiveKind::Text {
                    let name = fe.name_of(value).ok_or_else(|| fail("not a variant"))?;
                    (tp.parse)(name).ok_or_else(|| fail("cannot render variant name"))
                } else {
                    let d = fe.discriminant_of(value).ok_or_else(|| fail("not a variant"))?;
                    from_integer(tp, i128::from(d)).ok_or_else(|| fail(&format!("{d} out of range")))
                }
            }
            (Some(Scalar::Primitive(fp)), Some(Scalar::Enum(te))) => {
                if fp.kind == PrimitiveKind::Text {
                    let text = (fp.display)(value).ok_or_else(|| fail("not text"))?;
                    let text = text.trim();
                    te.from_name(text)
                        .or_else(|| text.parse::<i64>().ok().and_then(|d| te.from_discriminant(d)))
                        .ok_or_else(|| fail(&format!("no variant named '{text}'")))
                } else {
                    let n = fp
                        .as_integer
                        .and_then(|f| f(value))
                        .ok_or_else(|| fail("not an integer"))?;
                    i64::try_from(n)
                        .ok()
                        .and_then(|d| te.from_discriminant(d))
                        .ok_or_else(|| fail(&format!("no variant with value {n}")))
                }
            }
            (Some(Scalar::Primitive(fp)), Some(Scalar::Primitive(tp))) => convert_primitive(fp, tp, value)
                .ok_or_else(|| fail("value out of range or unparsable")),
            _ => Err(fail("no structural conversion")),
        }
    }
}

impl fmt::Debug for ConversionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionTable")
            .field("maps", &self.maps.len())
            .finish()
    }
}

fn scalar<'d>(primitive: Option<&'d PrimitiveInfo>, enumeration: Option<&'d EnumInfo>) -> Option<Scalar<'d>> {
    primitive
        .map(Scalar::Primitive)
        .or_else(|| enumeration.map(Scalar::Enum))
}

fn from_integer(info: &PrimitiveInfo, n: i128) -> Option<Value> {
    info.from_integer.and_then(|f| f(n))
}

fn convert_primitive(from: &PrimitiveInfo, to: &PrimitiveInfo, value: &dyn Any) -> Option<Value> {
    if to.kind == PrimitiveKind::Text {
        return (from.display)(value).and_then(|s| (to.parse)(&s));
    }
    if from.kind == PrimitiveKind::Text {
        return (from.display)(value).and_then(|s| (to.parse)(&s));
    }
    if let Some(n) = from.as_integer.and_then(|f| f(value)) {
        if let Some(converted) = from_integer(to, n) {
            return Some(converted);
        }
    }
    let x = from.as_float.and_then(|f| f(value))?;
    if let Some(from_float) = to.from_float {
        return from_float(x);
    }
    if x.is_finite() && x.fract() == 0.0 {
        #[allow(clippy::cast_possible_truncation)]
        let n = x as i128;
        return from_integer(to, n);
    }
    None
}
