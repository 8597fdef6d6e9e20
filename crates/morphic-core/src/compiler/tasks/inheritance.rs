//! Inheritance folding

use super::Task;
use crate::compiler::scaffold::Scaffold;
use crate::definition::FragmentCategory;
use crate::error::{MappingError, MappingResult};
use morphic_reflect::TypeKey;
use std::sync::Arc;

/// Collects own fragments plus the inherited fragments of every base
/// definition, transitively, base first
pub(crate) struct InitializeFragments;

impl Task for InitializeFragments {
    fn name(&self) -> &'static str {
        "initialize_fragments"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        let registry = scaffold.compiler.registry();
        let mut visited: Vec<(TypeKey, TypeKey)> = vec![(scaffold.source(), scaffold.target())];
        let mut chain = vec![Arc::clone(&scaffold.definition)];

        let mut current = Arc::clone(&scaffold.definition);
        while let Some((source, target)) = current.base() {
            let (source, target) = (source.non_nullable(), target.non_nullable());
            if visited
                .iter()
                .any(|(s, t)| s.same_type(&source) && t.same_type(&target))
            {
                let mut rendered: Vec<String> = visited.iter().map(|(s, t)| format!("{s} -> {t}")).collect();
                rendered.push(format!("{source} -> {target}"));
                return Err(MappingError::CyclicInheritance { chain: rendered });
            }
            visited.push((source, target));

            let Some(base) = registry.find(source, target) else {
                tracing::debug!(base_source = %source, base_target = %target, "base definition not registered");
                break;
            };
            chain.push(Arc::clone(&base));
            current = base;
        }

        for (level, definition) in chain.iter().enumerate().rev() {
            for fragment in definition.fragments() {
                if level == 0 || fragment.is_inherited() {
                    scaffold.push_candidate(Arc::clone(fragment));
                }
            }
        }

        for idx in scaffold.pending_rev(FragmentCategory::Inherits) {
            scaffold.mark_processed(idx);
        }
        Ok(())
    }
}
