//! Descriptors, members and base views

use super::Task;
use crate::compiler::ops::FragmentView;
use crate::compiler::scaffold::Scaffold;
use crate::error::{MappingError, MappingResult};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Loads both descriptors and member lists and computes, per candidate,
/// how the mapped pair is viewed as the fragment's own pair
pub(crate) struct InitializeVariables;

impl Task for InitializeVariables {
    fn name(&self) -> &'static str {
        "initialize_variables"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        let gateway = scaffold.compiler.gateway();
        let config = scaffold.compiler.config();
        let (source, target) = (scaffold.source(), scaffold.target());

        scaffold.source_descriptor = gateway.descriptor(source);
        scaffold.target_descriptor = gateway.descriptor(target);
        scaffold.source_members = gateway.members(source, config.readable_members());
        scaffold.target_members = gateway.members(target, config.writable_members());

        let mut views: HashMap<(TypeId, TypeId), Arc<FragmentView>> = HashMap::new();
        for idx in 0..scaffold.candidates.len() {
            let fragment = scaffold.fragment(idx);
            let (base_source, base_target) = (fragment.source(), fragment.target());
            let key = (base_source.id(), base_target.id());
            let view = match views.get(&key) {
                Some(view) => Arc::clone(view),
                None => {
                    let source_path = gateway
                        .view_path(source, base_source)
                        .ok_or(MappingError::IncompatibleBase {
                            derived: source,
                            base: base_source,
                        })?;
                    let target_path = gateway
                        .view_path(target, base_target)
                        .ok_or(MappingError::IncompatibleBase {
                            derived: target,
                            base: base_target,
                        })?;
                    let view = Arc::new(FragmentView::new(base_source, base_target, source_path, target_path));
                    views.insert(key, Arc::clone(&view));
                    view
                }
            };
            scaffold.candidates[idx].view = Some(view);
        }
        Ok(())
    }
}
