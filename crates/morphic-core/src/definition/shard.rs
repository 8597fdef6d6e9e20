//! Member value sources and guards

use crate::context::MappingContext;
use crate::error::{MappingError, MappingResult};
use morphic_reflect::{TypeKey, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Produces a constant value
pub type ConstantFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Computes a value from the source
pub type LambdaFn = Arc<dyn Fn(&dyn Any) -> MappingResult<Option<Value>> + Send + Sync>;

/// Computes a value from the source, the current target and the context
pub type CallFn =
    Arc<dyn Fn(&dyn Any, &dyn Any, &mut MappingContext<'_>) -> MappingResult<Option<Value>> + Send + Sync>;

/// Predicate over the source
pub type PredicateFn = Arc<dyn Fn(&dyn Any) -> MappingResult<bool> + Send + Sync>;

fn call_fn<F>(f: F) -> CallFn
where
    F: Fn(&dyn Any, &dyn Any, &mut MappingContext<'_>) -> MappingResult<Option<Value>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What a shard does
#[derive(Clone)]
pub enum ShardKind {
    /// Fixed value
    Constant(ConstantFn),
    /// Expression over the source
    Lambda(LambdaFn),
    /// Callable taking the full mapping parameters
    Call(CallFn),
    /// Injection happens only if the predicate holds
    Condition(PredicateFn),
    /// Condition that never holds; suppresses the member
    Never,
    /// Value of a named source member, mapped to the target member type
    FromMember(String),
}

/// One value source or guard of a member fragment
#[derive(Clone)]
pub struct Shard {
    kind: ShardKind,
    produces: Option<TypeKey>,
}

impl Shard {
    /// Constant value
    #[must_use]
    pub fn constant<F>(value: F) -> Self
    where
        F: Any + Clone + Send + Sync,
    {
        Self {
            kind: ShardKind::Constant(Arc::new(move || Box::new(value.clone()) as Value)),
            produces: Some(TypeKey::of::<F>()),
        }
    }

    /// Value computed from the source
    #[must_use]
    pub fn lambda<S, F>(f: impl Fn(&S) -> F + Send + Sync + 'static) -> Self
    where
        S: Any,
        F: Any + Send + Sync,
    {
        Self::lambda_opt(move |s: &S| Some(f(s)))
    }

    /// Possibly-null value computed from the source
    #[must_use]
    pub fn lambda_opt<S, F>(f: impl Fn(&S) -> Option<F> + Send + Sync + 'static) -> Self
    where
        S: Any,
        F: Any + Send + Sync,
    {
        let lambda: LambdaFn = Arc::new(move |source: &dyn Any| {
            let source = source
                .downcast_ref::<S>()
                .ok_or_else(MappingError::type_mismatch::<S>)?;
            Ok(f(source).map(|v| Box::new(v) as Value))
        });
        Self {
            kind: ShardKind::Lambda(lambda),
            produces: Some(TypeKey::of::<F>()),
        }
    }

    /// Value computed from source, current target and context
    #[must_use]
    pub fn call<S, T, F>(
        f: impl Fn(&S, &T, &mut MappingContext<'_>) -> MappingResult<F> + Send + Sync + 'static,
    ) -> Self
    where
        S: Any,
        T: Any,
        F: Any + Send + Sync,
    {
        let call = call_fn(move |source, target, ctx| {
            let source = source
                .downcast_ref::<S>()
                .ok_or_else(MappingError::type_mismatch::<S>)?;
            let target = target
                .downcast_ref::<T>()
                .ok_or_else(MappingError::type_mismatch::<T>)?;
            Ok(Some(Box::new(f(source, target, ctx)?) as Value))
        });
        Self {
            kind: ShardKind::Call(call),
            produces: Some(TypeKey::of::<F>()),
        }
    }

    /// Guard: inject only when `predicate` holds for the source
    #[must_use]
    pub fn when<S>(predicate: impl Fn(&S) -> bool + Send + Sync + 'static) -> Self
    where
        S: Any,
    {
        let predicate: PredicateFn = Arc::new(move |source: &dyn Any| {
            source
                .downcast_ref::<S>()
                .map(&predicate)
                .ok_or_else(MappingError::type_mismatch::<S>)
        });
        Self {
            kind: ShardKind::Condition(predicate),
            produces: None,
        }
    }

    /// Guard that never holds
    #[must_use]
    pub fn never() -> Self {
        Self {
            kind: ShardKind::Never,
            produces: None,
        }
    }

    /// Value of the named source member
    #[must_use]
    pub fn from_member(name: impl Into<String>) -> Self {
        Self {
            kind: ShardKind::FromMember(name.into()),
            produces: None,
        }
    }

    /// Shard behaviour
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ShardKind {
        &self.kind
    }

    /// Type of the produced value; `None` for guards and member references
    #[inline]
    #[must_use]
    pub fn produces(&self) -> Option<TypeKey> {
        self.produces
    }

    /// Whether this shard is a guard
    #[inline]
    #[must_use]
    pub fn is_condition(&self) -> bool {
        matches!(self.kind, ShardKind::Condition(_) | ShardKind::Never)
    }

    /// Whether this shard supplies a value
    #[inline]
    #[must_use]
    pub fn is_value(&self) -> bool {
        !self.is_condition()
    }

    /// Evaluate a guard against the (viewed) source; value shards pass
    pub(crate) fn holds(&self, source: &dyn Any) -> MappingResult<bool> {
        match &self.kind {
            ShardKind::Condition(predicate) => predicate(source),
            ShardKind::Never => Ok(false),
            _ => Ok(true),
        }
    }
}

impl fmt::Debug for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ShardKind::Constant(_) => "constant".to_string(),
            ShardKind::Lambda(_) => "lambda".to_string(),
            ShardKind::Call(_) => "call".to_string(),
            ShardKind::Condition(_) => "condition".to_string(),
            ShardKind::Never => "never".to_string(),
            ShardKind::FromMember(name) => format!("from_member({name})"),
        };
        f.debug_struct("Shard")
            .field("kind", &kind)
            .field("produces", &self.produces)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order {
        total: u32,
    }

    #[test]
    fn lambda_reads_source() {
        let shard = Shard::lambda(|o: &Order| o.total * 2);
        let ShardKind::Lambda(f) = shard.kind() else {
            panic!("expected lambda");
        };
        let value = f(&Order { total: 21 }).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&42));
        assert_eq!(shard.produces(), Some(TypeKey::of::<u32>()));
    }

    #[test]
    fn lambda_rejects_wrong_source() {
        let shard = Shard::lambda(|o: &Order| o.total);
        let ShardKind::Lambda(f) = shard.kind() else {
            panic!("expected lambda");
        };
        assert!(matches!(f(&1u8), Err(MappingError::TypeMismatch { .. })));
    }

    #[test]
    fn guards() {
        let big = Shard::when(|o: &Order| o.total > 10);
        assert!(big.is_condition());
        assert!(big.holds(&Order { total: 11 }).unwrap());
        assert!(!big.holds(&Order { total: 1 }).unwrap());
        assert!(!Shard::never().holds(&Order { total: 1 }).unwrap());
        assert!(Shard::constant(3u8).holds(&Order { total: 1 }).unwrap());
    }

    #[test]
    fn from_member_has_no_fixed_type() {
        let shard = Shard::from_member("total");
        assert!(shard.is_value());
        assert!(shard.produces().is_none());
    }
}
