//! Target construction

use super::Task;
use crate::compiler::ops::{self, Op};
use crate::compiler::scaffold::Scaffold;
use crate::definition::{FragmentCategory, FragmentKind};
use crate::error::{MappingError, MappingResult};
use crate::mapping::{ConstructionStrategy, MappingKind};

/// Picks the first applicable strategy in the order activation, default
/// factory, custom factory, descriptor fallback
///
/// Factory fragments only apply when they construct this very target type,
/// so a base definition's factory never produces a base value here. All
/// factory fragments are consumed.
pub(crate) struct Construction;

impl Construction {
    fn select(scaffold: &Scaffold<'_>, applicable: &[usize]) -> MappingResult<Option<(ConstructionStrategy, ops::Construction)>> {
        let target = scaffold.target();
        let most_derived = |wanted: fn(&FragmentKind) -> bool| {
            applicable
                .iter()
                .copied()
                .find(|&idx| wanted(scaffold.candidates[idx].fragment.kind()))
        };

        if let Some(idx) = most_derived(|k| matches!(k, FragmentKind::Activate { .. })) {
            if let FragmentKind::Activate { constructor } = scaffold.fragment(idx).kind() {
                let descriptor = scaffold.target_descriptor.as_ref();
                match constructor {
                    Some(name) => {
                        let ctor = descriptor
                            .and_then(|d| d.named_constructor(name))
                            .ok_or_else(|| MappingError::UnknownConstructor {
                                target,
                                name: name.clone(),
                            })?;
                        return Ok(Some((ConstructionStrategy::Activate, ops::Construction::Constructor(ctor.clone()))));
                    }
                    None => {
                        if let Some(ctor) = descriptor.and_then(|d| d.constructor()) {
                            return Ok(Some((ConstructionStrategy::Activate, ops::Construction::Constructor(ctor.clone()))));
                        }
                        tracing::debug!(target = %target, "activation requested but no default constructor");
                    }
                }
            }
        }

        if let Some(idx) = most_derived(|k| matches!(k, FragmentKind::DefaultFactory(_))) {
            if let FragmentKind::DefaultFactory(factory) = scaffold.fragment(idx).kind() {
                return Ok(Some((ConstructionStrategy::DefaultFactory, ops::Construction::Value(factory.clone()))));
            }
        }

        if let Some(idx) = most_derived(|k| matches!(k, FragmentKind::CustomFactory(_))) {
            if let FragmentKind::CustomFactory(factory) = scaffold.fragment(idx).kind() {
                return Ok(Some((
                    ConstructionStrategy::CustomFactory,
                    ops::Construction::Factory {
                        factory: factory.clone(),
                        view: scaffold.view(idx),
                    },
                )));
            }
        }

        Ok(scaffold
            .target_descriptor
            .as_ref()
            .and_then(|d| d.constructor())
            .map(|ctor| (ConstructionStrategy::Fallback, ops::Construction::Constructor(ctor.clone()))))
    }
}

impl Task for Construction {
    fn name(&self) -> &'static str {
        "construction"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        let target = scaffold.target();
        let factories = scaffold.pending_rev(FragmentCategory::Factory);
        let applicable: Vec<usize> = factories
            .iter()
            .copied()
            .filter(|&idx| scaffold.candidates[idx].fragment.target().same_type(&target))
            .collect();

        let selected = Self::select(scaffold, &applicable)?;
        for idx in factories {
            scaffold.mark_processed(idx);
        }

        let construction = match selected {
            Some((strategy, construction)) => {
                tracing::trace!(target = %target, strategy = ?strategy, "construction strategy selected");
                scaffold.strategy = Some(strategy);
                construction
            }
            // merges only construct when handed a null target
            None if scaffold.kind == MappingKind::Merge => ops::Construction::Unavailable,
            None => return Err(MappingError::NoConstructor { target }),
        };
        scaffold.emit(Op::Construct(construction));
        Ok(())
    }
}
