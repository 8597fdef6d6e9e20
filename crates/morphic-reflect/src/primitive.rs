//! Built-in primitive conversion table

use crate::descriptor::TypeDescriptor;
use crate::key::Value;
use std::any::Any;

/// Broad classification of a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Signed or unsigned integer
    Integer,
    /// Floating point
    Float,
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `String`
    Text,
}

/// Structural conversions available for a primitive type
///
/// Integers go through `i128` so every built-in integer type round-trips
/// losslessly; narrowing fails rather than truncating.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveInfo {
    /// Classification
    pub kind: PrimitiveKind,
    /// Read as an integer
    pub as_integer: Option<fn(&dyn Any) -> Option<i128>>,
    /// Build from an integer (checked)
    pub from_integer: Option<fn(i128) -> Option<Value>>,
    /// Read as a float
    pub as_float: Option<fn(&dyn Any) -> Option<f64>>,
    /// Build from a float
    pub from_float: Option<fn(f64) -> Option<Value>>,
    /// Render as text
    pub display: fn(&dyn Any) -> Option<String>,
    /// Parse from text
    pub parse: fn(&str) -> Option<Value>,
}

macro_rules! integer_descriptor {
    ($t:ty) => {
        TypeDescriptor::builder::<$t>().build().with_primitive(PrimitiveInfo {
            kind: PrimitiveKind::Integer,
            as_integer: Some(|v| v.downcast_ref::<$t>().map(|x| i128::from(*x))),
            from_integer: Some(|n| <$t>::try_from(n).ok().map(|x| Box::new(x) as Value)),
            as_float: Some(|v| v.downcast_ref::<$t>().map(|x| *x as f64)),
            from_float: None,
            display: |v| v.downcast_ref::<$t>().map(ToString::to_string),
            parse: |s| s.trim().parse::<$t>().ok().map(|x| Box::new(x) as Value),
        })
    };
}

macro_rules! float_descriptor {
    ($t:ty) => {
        TypeDescriptor::builder::<$t>().build().with_primitive(PrimitiveInfo {
            kind: PrimitiveKind::Float,
            as_integer: None,
            from_integer: None,
            as_float: Some(|v| v.downcast_ref::<$t>().map(|x| f64::from(*x))),
            from_float: Some(|f| Some(Box::new(f as $t) as Value)),
            display: |v| v.downcast_ref::<$t>().map(ToString::to_string),
            parse: |s| s.trim().parse::<$t>().ok().map(|x| Box::new(x) as Value),
        })
    };
}

/// Descriptors for every built-in primitive
pub(crate) fn builtin_descriptors() -> Vec<TypeDescriptor> {
    vec![
        integer_descriptor!(i8),
        integer_descriptor!(i16),
        integer_descriptor!(i32),
        integer_descriptor!(i64),
        integer_descriptor!(u8),
        integer_descriptor!(u16),
        integer_descriptor!(u32),
        integer_descriptor!(u64),
        float_descriptor!(f32),
        float_descriptor!(f64),
        TypeDescriptor::builder::<bool>().build().with_primitive(PrimitiveInfo {
            kind: PrimitiveKind::Bool,
            as_integer: Some(|v| v.downcast_ref::<bool>().map(|b| i128::from(*b))),
            from_integer: Some(|n| match n {
                0 => Some(Box::new(false) as Value),
                1 => Some(Box::new(true) as Value),
                _ => None,
            }),
            as_float: None,
            from_float: None,
            display: |v| v.downcast_ref::<bool>().map(ToString::to_string),
            parse: |s| s.trim().parse::<bool>().ok().map(|x| Box::new(x) as Value),
        }),
        TypeDescriptor::builder::<char>().build().with_primitive(PrimitiveInfo {
            kind: PrimitiveKind::Char,
            as_integer: Some(|v| v.downcast_ref::<char>().map(|c| i128::from(u32::from(*c)))),
            from_integer: Some(|n| {
                u32::try_from(n)
                    .ok()
                    .and_then(char::from_u32)
                    .map(|c| Box::new(c) as Value)
            }),
            as_float: None,
            from_float: None,
            display: |v| v.downcast_ref::<char>().map(ToString::to_string),
            parse: |s| {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Box::new(c) as Value),
                    _ => None,
                }
            },
        }),
        TypeDescriptor::builder::<String>().build().with_primitive(PrimitiveInfo {
            kind: PrimitiveKind::Text,
            as_integer: None,
            from_integer: None,
            as_float: None,
            from_float: None,
            display: |v| v.downcast_ref::<String>().cloned(),
            parse: |s| Some(Box::new(s.to_string()) as Value),
        }),
    ]
}
