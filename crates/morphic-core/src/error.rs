//! Error types for the mapping engine
//!
//! Provides error handling for:
//! - Unsupported or malformed mappings
//! - Null handling violations
//! - Inheritance and object-graph cycles
//! - Conversion failures
//! - Registration-time validation

use crate::mapping::MappingKind;
use morphic_reflect::{CollectionKind, ReflectError, TypeKey};

/// Result alias used throughout the engine
pub type MappingResult<T> = Result<T, MappingError>;

/// Main mapping error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    /// No mapping exists for the requested pair
    #[error("no {kind} mapping from {from} to {to}")]
    Unsupported {
        /// Source type
        from: TypeKey,
        /// Target type
        to: TypeKey,
        /// Requested kind
        kind: MappingKind,
    },

    /// Null source mapped onto a non-nullable target
    #[error("cannot map null {from} onto non-nullable {to}")]
    NullMapping {
        /// Source type
        from: TypeKey,
        /// Target type
        to: TypeKey,
    },

    /// Mapping produced null where a value was required
    #[error("mapping from {from} to {to} produced null")]
    NullResult {
        /// Source type
        from: TypeKey,
        /// Target type
        to: TypeKey,
    },

    /// Definition inheritance chain loops back on itself
    #[error("cyclic definition inheritance: {}", chain.join(" -> "))]
    CyclicInheritance {
        /// Visited (source, target) pairs, rendered
        chain: Vec<String>,
    },

    /// Inherited definition is not a base of the derived pair
    #[error("{derived} cannot inherit from {base}: not an embedded base")]
    IncompatibleBase {
        /// Derived type
        derived: TypeKey,
        /// Declared base type
        base: TypeKey,
    },

    /// Source graph references an object still being mapped
    #[error("cyclic object graph while mapping {from} to {to}")]
    CyclicGraph {
        /// Source type
        from: TypeKey,
        /// Target type
        to: TypeKey,
    },

    /// No construction strategy applies to the target
    #[error("no way to construct {target}")]
    NoConstructor {
        /// Target type
        target: TypeKey,
    },

    /// Named member does not exist or lacks the required accessor
    #[error("unknown member '{member}' on {ty}")]
    UnknownMember {
        /// Declaring type
        ty: TypeKey,
        /// Member name
        member: String,
    },

    /// Activation fragment names a constructor the type does not have
    #[error("unknown constructor '{name}' on {target}")]
    UnknownConstructor {
        /// Target type
        target: TypeKey,
        /// Constructor name
        name: String,
    },

    /// Value handed to a typed callable has the wrong type
    #[error("type mismatch: expected {expected}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
    },

    /// Conversion between two primitives or enums failed
    #[error("cannot convert {from} to {to}: {reason}")]
    ConversionFailed {
        /// Source type
        from: TypeKey,
        /// Target type
        to: TypeKey,
        /// Human-readable cause
        reason: String,
    },

    /// No concrete collection registered for an abstract collection request
    #[error("no concrete {kind} registered for element {element}")]
    UnregisteredCollection {
        /// Requested collection interface
        kind: CollectionKind,
        /// Element type
        element: TypeKey,
    },

    /// Nested mapping recursion went past the configured limit
    #[error("mapping depth exceeded limit of {limit}")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// Reflection access failed
    #[error("reflection error: {0}")]
    Reflect(#[from] ReflectError),

    /// Registration-time validation failed
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// Error raised by user-supplied callables
    #[error("{0}")]
    Custom(String),
}

impl MappingError {
    /// Unsupported mapping pair
    #[inline]
    #[must_use]
    pub fn unsupported(from: TypeKey, to: TypeKey, kind: MappingKind) -> Self {
        Self::Unsupported { from, to, kind }
    }

    /// Typed callable received something other than `T`
    #[must_use]
    pub fn type_mismatch<T: ?Sized>() -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
        }
    }

    /// Conversion failure with a reason
    #[must_use]
    pub fn conversion(from: TypeKey, to: TypeKey, reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            from,
            to,
            reason: reason.into(),
        }
    }

    /// Error from user code
    #[must_use]
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Whether the error reflects a configuration defect rather than bad input
    #[must_use]
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            Self::Unsupported { .. }
                | Self::CyclicInheritance { .. }
                | Self::IncompatibleBase { .. }
                | Self::NoConstructor { .. }
                | Self::UnknownMember { .. }
                | Self::UnknownConstructor { .. }
                | Self::UnregisteredCollection { .. }
                | Self::Registration(_)
                | Self::Config(_)
        )
    }
}

/// Errors raised while registering engine collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// Family name not known to the gateway
    #[error("unknown collection family '{0}'")]
    UnknownFamily(String),

    /// Family cannot be instantiated
    #[error("collection family '{0}' is abstract")]
    AbstractFamily(String),

    /// Family does not implement the interface it is bound to
    #[error("collection family '{family}' does not implement {kind}")]
    NotImplemented {
        /// Family name
        family: String,
        /// Interface
        kind: CollectionKind,
    },

    /// Family is not generic over exactly one element type
    #[error("collection family '{family}' has arity {arity}, expected 1")]
    Arity {
        /// Family name
        family: String,
        /// Declared arity
        arity: usize,
    },

    /// Matching template has no member-name placeholder
    #[error("matching template '{0}' has no {{name}} placeholder")]
    MissingPlaceholder(String),

    /// Matching template does not compile to a regular expression
    #[error("matching template '{template}' is not a valid pattern: {reason}")]
    InvalidPattern {
        /// Template as given
        template: String,
        /// Regex compiler message
        reason: String,
    },
}
