//! Lifecycle triggers and routine exit

use super::Task;
use crate::compiler::ops::Op;
use crate::compiler::scaffold::Scaffold;
use crate::definition::{FragmentKind, TriggerEvent};
use crate::error::MappingResult;

/// Emits every trigger for one event, base first
pub(crate) struct Trigger(pub(crate) TriggerEvent);

impl Task for Trigger {
    fn name(&self) -> &'static str {
        match self.0 {
            TriggerEvent::Created => "trigger_created",
            TriggerEvent::Completed => "trigger_completed",
        }
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        for idx in scaffold.pending() {
            let fragment = scaffold.fragment(idx);
            let FragmentKind::Trigger { event, action } = fragment.kind() else {
                continue;
            };
            if *event != self.0 {
                continue;
            }
            let view = scaffold.view(idx);
            scaffold.emit(Op::Trigger {
                event: *event,
                action: action.clone(),
                view,
            });
            scaffold.mark_processed(idx);
        }
        Ok(())
    }
}

/// Places the exit label and the final return
pub(crate) struct Return;

impl Task for Return {
    fn name(&self) -> &'static str {
        "return"
    }

    fn execute(&self, scaffold: &mut Scaffold<'_>) -> MappingResult<()> {
        let exit = scaffold.exit;
        scaffold.place(exit);
        scaffold.emit(Op::Return);
        Ok(())
    }
}
