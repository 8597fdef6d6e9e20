//! Null source early exit

use super::Task;
use crate::compiler::ops::Op;
use crate::compiler::scaffold::Scaffold;
use crate::definition::{FragmentCategory, FragmentKind, NullSourceBehavior};
use crate::error::MappingResult;
use std::sync::Arc;

/// Emits the null check; the most derived null-source fragment decides the
/// outcome. Without one, value-type targets get their default value and
/// reference-type targets are null
pub(crate) struct NullSource;

impl Task for NullSource {
    fn name(&self) -> &'static str {
        "null_source"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        let mut behavior = None;
        for idx in scaffold.pending_rev(FragmentCategory::NullSource) {
            if let FragmentKind::NullSource(b) = scaffold.fragment(idx).kind() {
                behavior.get_or_insert_with(|| b.clone());
            }
            scaffold.mark_processed(idx);
        }
        if behavior.is_none() {
            behavior = scaffold
                .target_descriptor
                .as_ref()
                .filter(|d| !d.is_reference())
                .and_then(|d| d.constructor())
                .map(|ctor| NullSourceBehavior::Default(Arc::clone(ctor)));
        }
        let exit = scaffold.exit;
        scaffold.emit(Op::NullSource { behavior, exit });
        Ok(())
    }
}
