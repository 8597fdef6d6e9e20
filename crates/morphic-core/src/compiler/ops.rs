//! Compiled operations and the routine that runs them

use crate::context::MappingContext;
use crate::definition::{FactoryFn, NullSourceBehavior, Shard, ShardKind, TriggerEvent, TriggerFn, ValueFactory};
use crate::error::{MappingError, MappingResult};
use crate::mapping::{MappingKind, Merge, MergeResult, Transform};
use morphic_reflect::{value_ref, Constructor, MemberInfo, TypeKey, Value, ViewPath};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;

/// Jump target inside a routine
pub(crate) type Label = usize;

pub(crate) enum Flow {
    Next,
    Jump(Label),
    Return,
}

/// How values of the mapped pair are seen as a fragment's own pair
pub(crate) struct FragmentView {
    source_base: TypeKey,
    target_base: TypeKey,
    source: ViewPath,
    target: ViewPath,
}

impl FragmentView {
    pub(crate) fn new(source_base: TypeKey, target_base: TypeKey, source: ViewPath, target: ViewPath) -> Self {
        Self {
            source_base,
            target_base,
            source,
            target,
        }
    }

    pub(crate) fn identity(source: TypeKey, target: TypeKey) -> Self {
        Self::new(source, target, ViewPath::default(), ViewPath::default())
    }

    pub(crate) fn source<'a>(&self, value: &'a dyn Any) -> MappingResult<&'a dyn Any> {
        self.source.apply(value).ok_or_else(|| MappingError::TypeMismatch {
            expected: self.source_base.name().to_string(),
        })
    }

    pub(crate) fn target<'a>(&self, value: &'a dyn Any) -> MappingResult<&'a dyn Any> {
        self.target.apply(value).ok_or_else(|| MappingError::TypeMismatch {
            expected: self.target_base.name().to_string(),
        })
    }

    pub(crate) fn target_mut<'a>(&self, value: &'a mut dyn Any) -> MappingResult<&'a mut dyn Any> {
        self.target.apply_mut(value).ok_or_else(|| MappingError::TypeMismatch {
            expected: self.target_base.name().to_string(),
        })
    }
}

/// Guard evaluated before a member assignment
#[derive(Clone)]
pub(crate) struct Gate {
    shard: Shard,
    view: Arc<FragmentView>,
}

impl Gate {
    pub(crate) fn new(shard: Shard, view: Arc<FragmentView>) -> Self {
        Self { shard, view }
    }

    pub(crate) fn is_never(&self) -> bool {
        matches!(self.shard.kind(), ShardKind::Never)
    }
}

pub(crate) enum Construction {
    Constructor(Constructor),
    Value(ValueFactory),
    Factory {
        factory: FactoryFn,
        view: Arc<FragmentView>,
    },
    Unavailable,
}

pub(crate) enum ValueSource {
    /// Constant, lambda or call shard
    Shard { shard: Shard, view: Arc<FragmentView> },
    /// Member of the source value
    Member(MemberInfo),
}

/// Assign one target member
pub(crate) struct AssignMember {
    member: MemberInfo,
    value: ValueSource,
    gates: Vec<Gate>,
    merge_in_place: bool,
    nested_transform: OnceCell<Arc<Transform>>,
    nested_merge: OnceCell<Arc<Merge>>,
}

impl AssignMember {
    pub(crate) fn new(member: MemberInfo, value: ValueSource, gates: Vec<Gate>, merge_in_place: bool) -> Self {
        Self {
            member,
            value,
            gates,
            merge_in_place,
            nested_transform: OnceCell::new(),
            nested_merge: OnceCell::new(),
        }
    }

    fn execute(&self, frame: &mut Frame<'_, '_>, ctx: &mut MappingContext<'_>) -> MappingResult<Flow> {
        let source = frame.source()?;
        for gate in &self.gates {
            if !gate.shard.holds(gate.view.source(source)?)? {
                tracing::trace!(member = self.member.name(), "assignment gated off");
                return Ok(Flow::Next);
            }
        }

        match &self.value {
            ValueSource::Member(source_member) => {
                let value = source_member.get(source)?;
                if self.merge_in_place {
                    if let Some(existing) = self.member.get_mut(frame.target_mut()?)? {
                        let result = self.merge_nested(value, existing, source_member.ty(), ctx)?;
                        if result.is_replace() {
                            return self.store(result.into_replacement(), frame);
                        }
                        return Ok(Flow::Next);
                    }
                }
                let produced = self.transform_nested(value, source_member.ty(), ctx)?;
                self.store(produced, frame)
            }
            ValueSource::Shard { shard, view } => {
                let produced = match shard.kind() {
                    ShardKind::Constant(constant) => Some(constant()),
                    ShardKind::Lambda(lambda) => lambda(view.source(source)?)?,
                    ShardKind::Call(call) => {
                        let target = view.target(frame.target_ref()?)?;
                        call(view.source(source)?, target, ctx)?
                    }
                    ShardKind::Condition(_) | ShardKind::Never | ShardKind::FromMember(_) => return Ok(Flow::Next),
                };
                let from = shard.produces().unwrap_or_else(|| self.member.ty());
                let produced = match produced {
                    Some(value) if !from.same_type(&self.member.ty()) => {
                        self.transform_nested(Some(value_ref(&value)), from, ctx)?
                    }
                    produced => produced,
                };
                self.store(produced, frame)
            }
        }
    }

    fn transform_nested(
        &self,
        value: Option<&dyn Any>,
        from: TypeKey,
        ctx: &mut MappingContext<'_>,
    ) -> MappingResult<Option<Value>> {
        if value.is_none() {
            return Ok(None);
        }
        let to = self.member.ty().non_nullable();
        let transform = self
            .nested_transform
            .get_or_try_init(|| ctx.transformer(from.non_nullable(), to))?;
        ctx.run_transform(transform, value)
    }

    fn merge_nested(
        &self,
        value: Option<&dyn Any>,
        existing: &mut dyn Any,
        from: TypeKey,
        ctx: &mut MappingContext<'_>,
    ) -> MappingResult<MergeResult> {
        if value.is_none() && self.member.ty().is_nullable() {
            return Ok(MergeResult::replace(None));
        }
        let to = self.member.ty().non_nullable();
        let merge = self
            .nested_merge
            .get_or_try_init(|| ctx.merger(from.non_nullable(), to))?;
        ctx.run_merge(merge, value, Some(existing))
    }

    fn store(&self, value: Option<Value>, frame: &mut Frame<'_, '_>) -> MappingResult<Flow> {
        if value.is_none() && !self.member.ty().is_nullable() {
            tracing::trace!(member = self.member.name(), "null skipped for non-nullable member");
            return Ok(Flow::Next);
        }
        self.member.set(frame.target_mut()?, value)?;
        Ok(Flow::Next)
    }
}

pub(crate) enum Op {
    /// Early exit for a null source
    NullSource {
        behavior: Option<NullSourceBehavior>,
        exit: Label,
    },
    /// Reuse the target already produced for this source
    IdentityLookup { exit: Label },
    /// Construct the target unless one is present
    Construct(Construction),
    /// Mark this source as being mapped
    IdentityReserve,
    Trigger {
        event: TriggerEvent,
        action: TriggerFn,
        view: Arc<FragmentView>,
    },
    Assign(Box<AssignMember>),
    /// Record the finished target for this source
    IdentityComplete,
    Return,
}

pub(crate) enum TargetSlot<'t> {
    Empty,
    Null,
    Owned(Value),
    Borrowed(&'t mut dyn Any),
}

/// Runtime state of one routine invocation
pub(crate) struct Frame<'s, 't> {
    from: TypeKey,
    to: TypeKey,
    source: Option<&'s dyn Any>,
    slot: TargetSlot<'t>,
    created: bool,
}

impl<'s, 't> Frame<'s, 't> {
    pub(crate) fn new(from: TypeKey, to: TypeKey, source: Option<&'s dyn Any>, target: Option<&'t mut dyn Any>) -> Self {
        Self {
            from,
            to,
            source,
            slot: target.map_or(TargetSlot::Empty, TargetSlot::Borrowed),
            created: false,
        }
    }

    fn source(&self) -> MappingResult<&'s dyn Any> {
        self.source.ok_or(MappingError::NullMapping {
            from: self.from,
            to: self.to,
        })
    }

    fn has_target(&self) -> bool {
        matches!(self.slot, TargetSlot::Owned(_) | TargetSlot::Borrowed(_))
    }

    fn target_ref(&self) -> MappingResult<&dyn Any> {
        match &self.slot {
            TargetSlot::Owned(value) => Ok(value_ref(value)),
            TargetSlot::Borrowed(target) => {
                let target: &dyn Any = &**target;
                Ok(target)
            }
            TargetSlot::Empty | TargetSlot::Null => Err(self.missing_target()),
        }
    }

    fn target_mut(&mut self) -> MappingResult<&mut dyn Any> {
        let missing = self.missing_target();
        match &mut self.slot {
            TargetSlot::Owned(value) => {
                let target: &mut dyn Any = value.as_mut();
                Ok(target)
            }
            TargetSlot::Borrowed(target) => {
                let target: &mut dyn Any = &mut **target;
                Ok(target)
            }
            TargetSlot::Empty | TargetSlot::Null => Err(missing),
        }
    }

    fn missing_target(&self) -> MappingError {
        MappingError::NullResult {
            from: self.from,
            to: self.to,
        }
    }

    /// Result of a transform invocation
    pub(crate) fn into_transform(self) -> Option<Value> {
        match self.slot {
            TargetSlot::Owned(value) => Some(value),
            TargetSlot::Empty | TargetSlot::Null | TargetSlot::Borrowed(_) => None,
        }
    }

    /// Result of a merge invocation
    pub(crate) fn into_merge(self) -> MergeResult {
        match self.slot {
            TargetSlot::Borrowed(_) => MergeResult::updated(),
            TargetSlot::Owned(value) => MergeResult::replace(Some(value)),
            TargetSlot::Empty | TargetSlot::Null => MergeResult::replace(None),
        }
    }
}

/// Linear op list with resolved labels
pub(crate) struct Routine {
    source: TypeKey,
    target: TypeKey,
    kind: MappingKind,
    ops: Vec<Op>,
    labels: Vec<usize>,
}

impl Routine {
    pub(crate) fn new(source: TypeKey, target: TypeKey, kind: MappingKind, ops: Vec<Op>, labels: Vec<usize>) -> Self {
        Self {
            source,
            target,
            kind,
            ops,
            labels,
        }
    }

    pub(crate) fn source(&self) -> TypeKey {
        self.source
    }

    pub(crate) fn target(&self) -> TypeKey {
        self.target
    }

    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }

    pub(crate) fn run(&self, frame: &mut Frame<'_, '_>, ctx: &mut MappingContext<'_>) -> MappingResult<()> {
        if let Some(source) = frame.source {
            if !self.source.matches(source) {
                return Err(MappingError::TypeMismatch {
                    expected: self.source.name().to_string(),
                });
            }
        }

        let mut pc = 0;
        while let Some(op) = self.ops.get(pc) {
            match self.execute(op, frame, ctx)? {
                Flow::Next => pc += 1,
                Flow::Jump(label) => pc = self.labels.get(label).copied().unwrap_or(self.ops.len()),
                Flow::Return => break,
            }
        }
        Ok(())
    }

    fn execute(&self, op: &Op, frame: &mut Frame<'_, '_>, ctx: &mut MappingContext<'_>) -> MappingResult<Flow> {
        match op {
            Op::NullSource { behavior, exit } => {
                if frame.source.is_some() {
                    return Ok(Flow::Next);
                }
                let outcome = match behavior {
                    None => None,
                    Some(NullSourceBehavior::Default(factory)) => Some(factory()),
                    Some(NullSourceBehavior::Factory(factory)) => factory(ctx)?,
                };
                frame.slot = outcome.map_or(TargetSlot::Null, TargetSlot::Owned);
                Ok(Flow::Jump(*exit))
            }
            Op::IdentityLookup { exit } => match ctx.identity_lookup(frame.source()?, self.source, self.target)? {
                Some(hit) => {
                    frame.slot = TargetSlot::Owned(hit);
                    Ok(Flow::Jump(*exit))
                }
                None => Ok(Flow::Next),
            },
            Op::Construct(construction) => {
                if frame.has_target() {
                    return Ok(Flow::Next);
                }
                let value = match construction {
                    Construction::Constructor(constructor) => constructor(),
                    Construction::Value(factory) => factory(),
                    Construction::Factory { factory, view } => factory(view.source(frame.source()?)?, ctx)?,
                    Construction::Unavailable => return Err(MappingError::NoConstructor { target: self.target }),
                };
                if !self.target.matches(value_ref(&value)) {
                    return Err(MappingError::TypeMismatch {
                        expected: self.target.name().to_string(),
                    });
                }
                frame.slot = TargetSlot::Owned(value);
                frame.created = true;
                Ok(Flow::Next)
            }
            Op::IdentityReserve => {
                ctx.identity_reserve(frame.source()?, self.target);
                Ok(Flow::Next)
            }
            Op::Trigger { event, action, view } => {
                if *event == TriggerEvent::Created && !frame.created {
                    return Ok(Flow::Next);
                }
                let source = view.source(frame.source()?)?;
                let target = view.target_mut(frame.target_mut()?)?;
                action(source, target, ctx)?;
                Ok(Flow::Next)
            }
            Op::Assign(assign) => assign.execute(frame, ctx),
            Op::IdentityComplete => {
                let source = frame.source()?;
                ctx.identity_complete(source, self.target, frame.target_ref()?);
                Ok(Flow::Next)
            }
            Op::Return => {
                tracing::trace!(
                    source = %self.source,
                    target = %self.target,
                    kind = %self.kind,
                    created = frame.created,
                    "routine finished"
                );
                Ok(Flow::Return)
            }
        }
    }
}
