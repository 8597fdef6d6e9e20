//! Enumeration metadata

use crate::key::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Field-less enum with named, numbered variants
///
/// # Example
///
/// ```rust
/// use morphic_reflect::EnumRepr;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Color {
///     Red = 0,
///     Green = 1,
/// }
///
/// impl EnumRepr for Color {
///     fn variants() -> &'static [Self] {
///         &[Color::Red, Color::Green]
///     }
///
///     fn name(self) -> &'static str {
///         match self {
///             Color::Red => "Red",
///             Color::Green => "Green",
///         }
///     }
///
///     fn discriminant(self) -> i64 {
///         self as i64
///     }
/// }
///
/// assert_eq!(Color::from_name("Green"), Some(Color::Green));
/// ```
pub trait EnumRepr: Copy + Send + Sync + 'static {
    /// All variants, in declaration order
    fn variants() -> &'static [Self];

    /// Variant name
    fn name(self) -> &'static str;

    /// Numeric value of the variant
    fn discriminant(self) -> i64;

    /// Variant with the given name (case-sensitive)
    #[must_use]
    fn from_name(name: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.name() == name)
    }

    /// Variant with the given numeric value
    #[must_use]
    fn from_discriminant(value: i64) -> Option<Self> {
        Self::variants()
            .iter()
            .copied()
            .find(|v| v.discriminant() == value)
    }
}

/// Type-erased enumeration metadata
#[derive(Clone)]
pub struct EnumInfo {
    variants: Vec<(&'static str, i64)>,
    discriminant: Arc<dyn Fn(&dyn Any) -> Option<i64> + Send + Sync>,
    from_discriminant: Arc<dyn Fn(i64) -> Option<Value> + Send + Sync>,
}

impl EnumInfo {
    /// Capture metadata for `E`
    #[must_use]
    pub fn of<E: EnumRepr>() -> Self {
        Self {
            variants: E::variants()
                .iter()
                .map(|v| (v.name(), v.discriminant()))
                .collect(),
            discriminant: Arc::new(|value: &dyn Any| {
                value.downcast_ref::<E>().map(|v| v.discriminant())
            }),
            from_discriminant: Arc::new(|d| E::from_discriminant(d).map(|v| Box::new(v) as Value)),
        }
    }

    /// `(name, discriminant)` pairs in declaration order
    #[inline]
    #[must_use]
    pub fn variants(&self) -> &[(&'static str, i64)] {
        &self.variants
    }

    /// Discriminant of an enum value
    #[inline]
    #[must_use]
    pub fn discriminant_of(&self, value: &dyn Any) -> Option<i64> {
        (self.discriminant)(value)
    }

    /// Name of an enum value
    #[must_use]
    pub fn name_of(&self, value: &dyn Any) -> Option<&'static str> {
        let d = self.discriminant_of(value)?;
        self.variants
            .iter()
            .find(|(_, v)| *v == d)
            .map(|(name, _)| *name)
    }

    /// Instantiate the variant with discriminant `value`
    #[inline]
    #[must_use]
    pub fn from_discriminant(&self, value: i64) -> Option<Value> {
        (self.from_discriminant)(value)
    }

    /// Instantiate the variant called `name`
    #[must_use]
    pub fn from_name(&self, name: &str) -> Option<Value> {
        self.variants
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, d)| self.from_discriminant(*d))
    }
}

impl fmt::Debug for EnumInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumInfo")
            .field("variants", &self.variants)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Level {
        Low = 1,
        High = 5,
    }

    impl EnumRepr for Level {
        fn variants() -> &'static [Self] {
            &[Level::Low, Level::High]
        }

        fn name(self) -> &'static str {
            match self {
                Level::Low => "Low",
                Level::High => "High",
            }
        }

        fn discriminant(self) -> i64 {
            self as i64
        }
    }

    #[test]
    fn repr_lookups() {
        assert_eq!(Level::from_name("High"), Some(Level::High));
        assert_eq!(Level::from_name("high"), None);
        assert_eq!(Level::from_discriminant(1), Some(Level::Low));
        assert_eq!(Level::from_discriminant(2), None);
    }

    #[test]
    fn info_is_type_erased() {
        let info = EnumInfo::of::<Level>();
        assert_eq!(info.variants(), &[("Low", 1), ("High", 5)]);
        assert_eq!(info.name_of(&Level::High), Some("High"));
        assert_eq!(info.discriminant_of(&Level::Low), Some(1));

        let value = info.from_name("High").unwrap();
        assert_eq!(value.downcast_ref::<Level>(), Some(&Level::High));
        assert!(info.from_discriminant(3).is_none());
    }
}
