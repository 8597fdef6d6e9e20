//! Compiler pipeline tasks
//!
//! Each task consumes some fragments from the scaffold and emits ops. The
//! order of the pipeline is the order of the generated routine.

mod auto;
mod construction;
mod identity;
mod inheritance;
mod members;
mod null_source;
mod triggers;
mod variables;

use super::scaffold::Scaffold;
use crate::definition::TriggerEvent;
use crate::error::MappingResult;
use crate::mapping::MappingKind;

pub(crate) use auto::AutoInjection;
pub(crate) use construction::Construction;
pub(crate) use identity::{IdentityComplete, IdentityLookup, IdentityReserve};
pub(crate) use inheritance::InitializeFragments;
pub(crate) use members::MemberFragments;
pub(crate) use null_source::NullSource;
pub(crate) use triggers::{Return, Trigger};
pub(crate) use variables::InitializeVariables;

/// One compilation step
pub(crate) trait Task: Send + Sync {
    /// Stable task name (for logs)
    fn name(&self) -> &'static str;

    /// Consume fragments and emit ops
    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()>;
}

/// Ordered tasks for `kind`
pub(crate) fn pipeline(kind: MappingKind) -> Vec<Box<dyn Task>> {
    match kind {
        MappingKind::Transform => vec![
            Box::new(InitializeFragments),
            Box::new(InitializeVariables),
            Box::new(NullSource),
            Box::new(IdentityLookup),
            Box::new(Construction),
            Box::new(IdentityReserve),
            Box::new(Trigger(TriggerEvent::Created)),
            Box::new(MemberFragments),
            Box::new(AutoInjection),
            Box::new(Trigger(TriggerEvent::Completed)),
            Box::new(IdentityComplete),
            Box::new(Return),
        ],
        MappingKind::Merge => vec![
            Box::new(InitializeFragments),
            Box::new(InitializeVariables),
            Box::new(NullSource),
            Box::new(Construction),
            Box::new(Trigger(TriggerEvent::Created)),
            Box::new(MemberFragments),
            Box::new(AutoInjection),
            Box::new(Trigger(TriggerEvent::Completed)),
            Box::new(Return),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_pipeline_skips_identity_tracking() {
        let names: Vec<_> = pipeline(MappingKind::Merge).iter().map(|t| t.name()).collect();
        assert!(!names.iter().any(|n| n.starts_with("identity")));
        assert_eq!(names.first(), Some(&"initialize_fragments"));
        assert_eq!(names.last(), Some(&"return"));
    }

    #[test]
    fn transform_pipeline_order() {
        let names: Vec<_> = pipeline(MappingKind::Transform).iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "initialize_fragments",
                "initialize_variables",
                "null_source",
                "identity_lookup",
                "construction",
                "identity_reserve",
                "trigger_created",
                "member_fragments",
                "auto_injection",
                "trigger_completed",
                "identity_complete",
                "return",
            ]
        );
    }
}
