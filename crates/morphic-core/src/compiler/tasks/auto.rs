//! Automatic member injection

use super::Task;
use crate::compiler::ops::{AssignMember, Op, ValueSource};
use crate::compiler::scaffold::Scaffold;
use crate::definition::{FragmentCategory, FragmentKind};
use crate::error::MappingResult;
use crate::matching::MatchingStrategy;
use std::sync::Arc;

/// Pairs every still unassigned writable target member with a source
/// member, trying strategies in declaration order
///
/// A proposal only counts when the member types are mappable.
pub(crate) struct AutoInjection;

impl Task for AutoInjection {
    fn name(&self) -> &'static str {
        "auto_injection"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        let mut strategies: Vec<Arc<dyn MatchingStrategy>> = Vec::new();
        for idx in scaffold.pending() {
            if scaffold.candidates[idx].fragment.category() != FragmentCategory::AutoInjection {
                continue;
            }
            if let FragmentKind::AutoInjection(strategy) = scaffold.fragment(idx).kind() {
                strategies.push(Arc::clone(strategy));
            }
            scaffold.mark_processed(idx);
        }
        if strategies.is_empty() {
            return Ok(());
        }

        let probe = scaffold.compiler.probe();
        let targets = scaffold.target_members.clone();
        for target in targets {
            if scaffold.assigned.contains(target.name()) {
                continue;
            }
            let found = strategies.iter().find_map(|strategy| {
                strategy
                    .find_match(&target, &scaffold.source_members)
                    .filter(|source| probe.can_map(source.ty(), target.ty()))
                    .map(|source| (strategy.name(), source.clone()))
            });
            let Some((strategy, source)) = found else {
                tracing::trace!(member = target.name(), "no automatic match");
                continue;
            };
            tracing::trace!(
                member = target.name(),
                source_member = source.name(),
                strategy,
                "member matched automatically"
            );

            let gates = scaffold.gates.get(target.name()).cloned().unwrap_or_default();
            let in_place = scaffold.merges_in_place(&target);
            scaffold.assigned.insert(target.name().to_string());
            scaffold.emit(Op::Assign(Box::new(AssignMember::new(
                target,
                ValueSource::Member(source),
                gates,
                in_place,
            ))));
        }
        Ok(())
    }
}
