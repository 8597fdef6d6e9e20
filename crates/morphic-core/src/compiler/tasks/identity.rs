//! Object identity tracking

use super::Task;
use crate::compiler::ops::Op;
use crate::compiler::scaffold::Scaffold;
use crate::error::MappingResult;
use crate::mapping::MappingKind;

/// Emits the identity cache lookup for reference-typed sources
pub(crate) struct IdentityLookup;

impl Task for IdentityLookup {
    fn name(&self) -> &'static str {
        "identity_lookup"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        let tracked = scaffold.kind == MappingKind::Transform
            && scaffold.compiler.config().identity_tracking
            && scaffold.source_descriptor.as_ref().is_some_and(|d| d.is_reference())
            && scaffold.target_descriptor.is_some();
        if tracked {
            scaffold.identity = true;
            let exit = scaffold.exit;
            scaffold.emit(Op::IdentityLookup { exit });
        }
        Ok(())
    }
}

/// Marks the source as in progress once its target exists
pub(crate) struct IdentityReserve;

impl Task for IdentityReserve {
    fn name(&self) -> &'static str {
        "identity_reserve"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        if scaffold.identity {
            scaffold.emit(Op::IdentityReserve);
        }
        Ok(())
    }
}

/// Records the finished target for the source
pub(crate) struct IdentityComplete;

impl Task for IdentityComplete {
    fn name(&self) -> &'static str {
        "identity_complete"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        if scaffold.identity {
            scaffold.emit(Op::IdentityComplete);
        }
        Ok(())
    }
}
