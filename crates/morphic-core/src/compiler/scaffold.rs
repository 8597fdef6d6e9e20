//! Mutable compilation state shared by the pipeline tasks

use super::ops::{FragmentView, Gate, Label, Op, Routine};
use super::MappingCompiler;
use crate::definition::{Definition, Fragment, FragmentCategory};
use crate::mapping::{ConstructionStrategy, MappingKind};
use indexmap::IndexMap;
use morphic_reflect::{MemberInfo, TypeDescriptor, TypeKey};
use std::collections::HashSet;
use std::sync::Arc;

/// Fragment taking part in a compilation, with the view onto its own pair
pub(crate) struct Candidate {
    pub(crate) fragment: Arc<Fragment>,
    pub(crate) view: Option<Arc<FragmentView>>,
    processed: bool,
}

pub(crate) struct Scaffold<'c> {
    pub(crate) compiler: &'c MappingCompiler,
    pub(crate) definition: Arc<Definition>,
    pub(crate) kind: MappingKind,
    /// Own and inherited fragments, base first, declaration order within a level
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) source_descriptor: Option<Arc<TypeDescriptor>>,
    pub(crate) target_descriptor: Option<Arc<TypeDescriptor>>,
    pub(crate) source_members: Vec<MemberInfo>,
    pub(crate) target_members: Vec<MemberInfo>,
    /// Target members handled explicitly or suppressed
    pub(crate) assigned: HashSet<String>,
    /// Guards per target member from condition-only member fragments
    pub(crate) gates: IndexMap<String, Vec<Gate>>,
    pub(crate) identity: bool,
    pub(crate) strategy: Option<ConstructionStrategy>,
    pub(crate) exit: Label,
    ops: Vec<Op>,
    labels: Vec<Option<usize>>,
}

impl<'c> Scaffold<'c> {
    pub(crate) fn new(compiler: &'c MappingCompiler, definition: Arc<Definition>, kind: MappingKind) -> Self {
        let mut scaffold = Self {
            compiler,
            definition,
            kind,
            candidates: Vec::new(),
            source_descriptor: None,
            target_descriptor: None,
            source_members: Vec::new(),
            target_members: Vec::new(),
            assigned: HashSet::new(),
            gates: IndexMap::new(),
            identity: false,
            strategy: None,
            exit: 0,
            ops: Vec::new(),
            labels: Vec::new(),
        };
        scaffold.exit = scaffold.new_label();
        scaffold
    }

    #[inline]
    pub(crate) fn source(&self) -> TypeKey {
        self.definition.source()
    }

    #[inline]
    pub(crate) fn target(&self) -> TypeKey {
        self.definition.target()
    }

    pub(crate) fn push_candidate(&mut self, fragment: Arc<Fragment>) {
        self.candidates.push(Candidate {
            fragment,
            view: None,
            processed: false,
        });
    }

    /// Unprocessed candidates, base first
    pub(crate) fn pending(&self) -> Vec<usize> {
        (0..self.candidates.len())
            .filter(|&idx| !self.candidates[idx].processed)
            .collect()
    }

    /// Unprocessed candidates of `category`, most derived first
    pub(crate) fn pending_rev(&self, category: FragmentCategory) -> Vec<usize> {
        let mut pending: Vec<usize> = self
            .pending()
            .into_iter()
            .filter(|&idx| self.candidates[idx].fragment.category() == category)
            .collect();
        pending.reverse();
        pending
    }

    #[inline]
    pub(crate) fn fragment(&self, idx: usize) -> Arc<Fragment> {
        Arc::clone(&self.candidates[idx].fragment)
    }

    pub(crate) fn view(&self, idx: usize) -> Arc<FragmentView> {
        self.candidates[idx]
            .view
            .clone()
            .unwrap_or_else(|| Arc::new(FragmentView::identity(self.source(), self.target())))
    }

    #[inline]
    pub(crate) fn mark_processed(&mut self, idx: usize) {
        self.candidates[idx].processed = true;
    }

    pub(crate) fn target_member(&self, name: &str) -> Option<&MemberInfo> {
        self.target_members.iter().find(|m| m.name() == name)
    }

    pub(crate) fn source_member(&self, name: &str) -> Option<&MemberInfo> {
        self.source_members.iter().find(|m| m.name() == name)
    }

    /// Whether a merge should update `member`'s current value in place
    pub(crate) fn merges_in_place(&self, member: &MemberInfo) -> bool {
        self.kind == MappingKind::Merge
            && member.is_mutable_in_place()
            && self
                .compiler
                .gateway()
                .descriptor(member.ty())
                .is_some_and(|d| d.is_reference())
    }

    pub(crate) fn emit(&mut self, op: Op) {
        self.ops.push(op);
    }

    pub(crate) fn new_label(&mut self) -> Label {
        self.labels.push(None);
        self.labels.len() - 1
    }

    /// Bind `label` to the next emitted op
    pub(crate) fn place(&mut self, label: Label) {
        if let Some(slot) = self.labels.get_mut(label) {
            *slot = Some(self.ops.len());
        }
    }

    pub(crate) fn finish(self) -> (Routine, Option<ConstructionStrategy>) {
        let leftover = self.candidates.iter().filter(|c| !c.processed).count();
        if leftover > 0 {
            tracing::debug!(
                source = %self.source(),
                target = %self.target(),
                leftover,
                "fragments not consumed by any task"
            );
        }
        let end = self.ops.len();
        let labels = self.labels.iter().map(|l| l.unwrap_or(end)).collect();
        let routine = Routine::new(self.source(), self.target(), self.kind, self.ops, labels);
        (routine, self.strategy)
    }
}
