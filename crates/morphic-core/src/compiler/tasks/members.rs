//! Explicit member configuration

use super::Task;
use crate::compiler::ops::{AssignMember, Gate, Op, ValueSource};
use crate::compiler::scaffold::Scaffold;
use crate::definition::{FragmentCategory, FragmentKind, Shard, ShardKind};
use crate::error::{MappingError, MappingResult};
use indexmap::IndexMap;

/// Turns member fragments into assignments
///
/// Condition-only fragments become gates on their member, whoever ends up
/// assigning it. Among value fragments for one member the most derived one
/// wins and its last value shard supplies the value.
pub(crate) struct MemberFragments;

impl Task for MemberFragments {
    fn name(&self) -> &'static str {
        "member_fragments"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        let pending = scaffold.pending();
        let mut winners: IndexMap<String, usize> = IndexMap::new();

        for idx in pending {
            let fragment = scaffold.fragment(idx);
            let FragmentKind::Member { name, shards } = fragment.kind() else {
                continue;
            };
            if shards.iter().all(Shard::is_condition) {
                let view = scaffold.view(idx);
                scaffold
                    .gates
                    .entry(name.clone())
                    .or_default()
                    .extend(shards.iter().map(|s| Gate::new(s.clone(), view.clone())));
            } else {
                winners.insert(name.clone(), idx);
            }
            scaffold.mark_processed(idx);
        }

        for (name, gates) in &scaffold.gates {
            if scaffold.target_member(name).is_none() {
                tracing::warn!(target = %scaffold.target(), member = %name, "guard on unknown target member");
            }
            if gates.iter().any(Gate::is_never) {
                scaffold.assigned.insert(name.clone());
            }
        }

        for (name, idx) in winners {
            if scaffold.assigned.contains(&name) {
                continue;
            }
            let fragment = scaffold.fragment(idx);
            let FragmentKind::Member { shards, .. } = fragment.kind() else {
                continue;
            };
            let target_member = scaffold
                .target_member(&name)
                .cloned()
                .ok_or_else(|| MappingError::UnknownMember {
                    ty: scaffold.target(),
                    member: name.clone(),
                })?;
            let view = scaffold.view(idx);

            let mut gates: Vec<Gate> = shards
                .iter()
                .filter(|s| s.is_condition())
                .map(|s| Gate::new(s.clone(), view.clone()))
                .collect();
            if let Some(shared) = scaffold.gates.get(&name) {
                gates.extend(shared.iter().cloned());
            }

            let Some(value_shard) = shards.iter().rev().find(|s| s.is_value()) else {
                continue;
            };
            let value = match value_shard.kind() {
                ShardKind::FromMember(source_name) => {
                    let source_member = scaffold
                        .source_member(source_name)
                        .cloned()
                        .ok_or_else(|| MappingError::UnknownMember {
                            ty: scaffold.source(),
                            member: source_name.clone(),
                        })?;
                    ValueSource::Member(source_member)
                }
                _ => ValueSource::Shard {
                    shard: value_shard.clone(),
                    view,
                },
            };

            let in_place = scaffold.merges_in_place(&target_member);
            scaffold.emit(Op::Assign(Box::new(AssignMember::new(target_member, value, gates, in_place))));
            scaffold.assigned.insert(name);
        }

        // leftover member fragments were shadowed by more derived ones
        for idx in scaffold.pending_rev(FragmentCategory::Member) {
            scaffold.mark_processed(idx);
        }
        Ok(())
    }
}
